//! Corner splitting: move each corner's sides and bridge them.
//!
//! Every analyzed corner turns into two on-curve points. The corner point
//! itself becomes the inbound terminus and keeps its id. A new line
//! segment, the connector, runs from there to the outbound origin.

use std::collections::BTreeMap;

use kurbo::{CubicBez, ParamCurve, Point};
use tracing::trace;

use crate::outline::{Outline, OutlinePoint, PointId, PointKind, Segment};

use super::analyze::{Analysis, Corner};

/// Where a corner sat before splitting. Pairing uses this to tell
/// neighbouring corners apart from distant ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSite {
    pub key: Point,
    pub contour: usize,
    pub segment: usize,
    pub contour_len: usize,
    pub closed: bool,
}

impl CornerSite {
    /// Whether the two corners are the same point or adjacent on one contour.
    pub fn touches(&self, other: &CornerSite) -> bool {
        if self.contour != other.contour {
            return false;
        }
        let d = self.segment.abs_diff(other.segment);
        d <= 1 || (self.closed && d + 1 == self.contour_len)
    }
}

/// A split corner: the inbound terminus and the connector after it.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub site: CornerSite,
    /// The original corner point, now the inbound terminus.
    pub corner: PointId,
    /// The on-curve point of the inserted connector, at the outbound origin.
    pub connector: PointId,
    pub inbound: Point,
    pub outbound: Point,
    pub inbound_curved: bool,
    pub outbound_curved: bool,
}

/// Apply `analysis` to a copy of `outline`.
///
/// Cubics with a corner at both ends are cut once, from the original
/// curve, so neither cut disturbs the other.
pub fn split_corners(outline: &Outline, analysis: &Analysis) -> (Outline, Vec<Junction>) {
    let mut out = outline.clone();
    let mut junctions = Vec::with_capacity(analysis.corners.len());

    for ci in 0..out.contours.len() {
        let corners: BTreeMap<usize, &Corner> = analysis
            .corners
            .iter()
            .filter(|c| c.contour == ci)
            .map(|c| (c.segment, c))
            .collect();
        if corners.is_empty() {
            continue;
        }
        let connectors: Vec<(usize, PointId)> =
            corners.keys().map(|&si| (si, out.fresh_id())).collect();

        let original = out.contours[ci].clone();
        let contour = &mut out.contours[ci];
        let n = original.len();

        for si in 0..n {
            let ending = corners.get(&si).copied();
            let starting = original.prev_index(si).and_then(|p| corners.get(&p).copied());
            if ending.is_none() && starting.is_none() {
                continue;
            }
            let src = &original.segments()[si];
            let seg = &mut contour.segments_mut()[si];
            if let (Some([c1, c2]), Some(start)) = (src.control_positions(), original.start_of(si)) {
                let curve = CubicBez::new(start, c1, c2, src.on.pos);
                let t0 = starting
                    .and_then(|c| c.outbound.split)
                    .map_or(0.0, |s| s.t);
                let t1 = ending.and_then(|c| c.inbound.split).map_or(1.0, |s| s.t);
                let sub = curve.subsegment(t0..t1);
                if let Some([a, b]) = seg.controls.as_mut() {
                    a.pos = sub.p1;
                    b.pos = sub.p2;
                }
            }
            if let Some(corner) = ending {
                seg.on.pos = corner.inbound.on;
                seg.on.smooth = false;
            }
        }

        let mut inserts: Vec<(usize, Segment)> = Vec::with_capacity(connectors.len());
        for &(si, id) in &connectors {
            let corner = corners[&si];
            let pos = if original.is_closed() && si + 1 == n { 0 } else { si + 1 };
            let on = OutlinePoint::new(id, corner.outbound.on, PointKind::Line);
            inserts.push((pos, Segment::line(on)));
            junctions.push(Junction {
                site: CornerSite {
                    key: corner.key,
                    contour: ci,
                    segment: si,
                    contour_len: n,
                    closed: original.is_closed(),
                },
                corner: corner.id,
                connector: id,
                inbound: corner.inbound.on,
                outbound: corner.outbound.on,
                inbound_curved: corner.inbound.is_curve(),
                outbound_curved: corner.outbound.is_curve(),
            });
        }
        inserts.sort_by(|a, b| b.0.cmp(&a.0));
        for (pos, seg) in inserts {
            contour.segments_mut().insert(pos, seg);
        }
        trace!(contour = ci, corners = corners.len(), "split corners");
    }

    (out, junctions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::analyze::analyze;
    use kurbo::BezPath;

    fn square() -> Outline {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((0.0, 100.0));
        p.line_to((100.0, 100.0));
        p.line_to((100.0, 0.0));
        p.close_path();
        Outline::from_bezpaths(&[p]).unwrap()
    }

    fn split_at(outline: &Outline, offset: f64) -> (Outline, Vec<Junction>) {
        split_corners(outline, &analyze(outline, offset, 1e-3))
    }

    fn close(a: Point, b: Point) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn chamfer_square_corner() {
        let mut outline = square();
        outline.select_at(Point::ZERO);
        let (out, junctions) = split_at(&outline, -10.0);
        let on = out.contours[0].on_curve_positions();
        assert_eq!(on.len(), 5);
        assert!(close(on[0], Point::new(10.0, 0.0)), "{on:?}");
        assert!(close(on[1], Point::new(0.0, 10.0)), "{on:?}");
        assert_eq!(&on[2..], &outline.contours[0].on_curve_positions()[1..]);
        assert_eq!(junctions.len(), 1);
        out.contours[0].validate().unwrap();
    }

    #[test]
    fn overlap_square_corner() {
        let mut outline = square();
        outline.select_at(Point::ZERO);
        let (out, junctions) = split_at(&outline, 10.0);
        let on = out.contours[0].on_curve_positions();
        assert!(close(on[0], Point::new(-10.0, 0.0)));
        assert!(close(on[1], Point::new(0.0, -10.0)));

        let connector = &out.contours[0].segments()[1].on;
        assert_eq!(connector.id, junctions[0].connector);
        assert_eq!(connector.kind, PointKind::Line);
        assert!(!connector.selected && !connector.smooth);
        // The corner point keeps its identity and selection.
        let corner = &out.contours[0].segments()[0].on;
        assert_eq!(corner.id, junctions[0].corner);
        assert!(corner.selected);
    }

    #[test]
    fn last_segment_connector_wraps_to_front() {
        let mut outline = square();
        outline.select_at(Point::new(100.0, 0.0));
        let (out, junctions) = split_at(&outline, -10.0);
        let c = &out.contours[0];
        c.validate().unwrap();
        assert_eq!(c.segments()[0].on.id, junctions[0].connector);
        assert!(close(c.segments()[0].on.pos, Point::new(90.0, 0.0)));
        assert!(close(c.segments()[4].on.pos, Point::new(100.0, 10.0)));
    }

    #[test]
    fn every_corner_adds_one_point() {
        let mut outline = square();
        for p in [(0.0, 0.0), (0.0, 100.0), (100.0, 100.0), (100.0, 0.0)] {
            outline.select_at(Point::new(p.0, p.1));
        }
        let (out, junctions) = split_at(&outline, 5.0);
        assert_eq!(junctions.len(), 4);
        assert_eq!(out.on_curve_count(), 8);
        out.contours[0].validate().unwrap();
        // Connectors sit straight after their corner.
        let c = &out.contours[0];
        for j in &junctions {
            let k = c.index_of(j.corner).unwrap();
            assert_eq!(c.segments()[c.next_index(k).unwrap()].on.id, j.connector);
        }
    }

    #[test]
    fn smooth_corner_becomes_sharp() {
        let mut outline = square();
        outline.contours[0].segments_mut()[2].on.smooth = true;
        outline.select_at(Point::new(100.0, 100.0));
        let (out, _) = split_at(&outline, 10.0);
        assert!(!out.contours[0].segments()[2].on.smooth);
    }

    #[test]
    fn shared_cubic_is_cut_from_both_ends() {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((0.0, 100.0));
        p.curve_to((55.0, 100.0), (100.0, 55.0), (100.0, 0.0));
        p.close_path();
        let mut outline = Outline::from_bezpaths(&[p]).unwrap();
        outline.select_at(Point::new(0.0, 100.0));
        outline.select_at(Point::new(100.0, 0.0));
        let analysis = analyze(&outline, -10.0, 1e-3);
        let (out, junctions) = split_corners(&outline, &analysis);
        let c = &out.contours[0];
        c.validate().unwrap();

        let start = junctions.iter().find(|j| j.site.segment == 1).unwrap();
        let end = junctions.iter().find(|j| j.site.segment == 2).unwrap();
        let k = c.index_of(end.corner).unwrap();
        let seg = &c.segments()[k];
        let [c1, c2] = seg.control_positions().unwrap();
        let from = c.start_of(k).unwrap();
        assert!(close(from, start.outbound));
        let kept = CubicBez::new(from, c1, c2, seg.on.pos);

        let t0 = analysis.outbound_of(start.corner).unwrap().split.unwrap().t;
        let t1 = analysis.inbound_of(end.corner).unwrap().split.unwrap().t;
        let curve = analysis.inbound_of(end.corner).unwrap().split.unwrap().curve;
        assert!(kept.eval(0.5).distance(curve.eval((t0 + t1) / 2.0)) < 1e-9);
        assert!(close(kept.p3, curve.eval(t1)));
    }

    #[test]
    fn single_curve_side_matches_analysis() {
        let mut p = BezPath::new();
        p.move_to((0.0, 0.0));
        p.line_to((0.0, 100.0));
        p.curve_to((55.0, 100.0), (100.0, 55.0), (100.0, 0.0));
        p.close_path();
        let mut outline = Outline::from_bezpaths(&[p]).unwrap();
        outline.select_at(Point::new(100.0, 0.0));
        let analysis = analyze(&outline, 12.0, 1e-3);
        let (out, _) = split_corners(&outline, &analysis);
        // The wrap connector lands at index 0, shifting the cubic along.
        let c = &out.contours[0];
        let k = c.index_of(analysis.corners[0].id).unwrap();
        assert_eq!(k, 3);
        let seg = &c.segments()[k];
        let side = analysis.corners[0].inbound;
        assert_eq!(seg.control_positions(), side.controls);
        assert_eq!(seg.on.pos, side.on);
    }

    #[test]
    fn touching_sites() {
        let site = |contour, segment| CornerSite {
            key: Point::ZERO,
            contour,
            segment,
            contour_len: 6,
            closed: true,
        };
        assert!(site(0, 0).touches(&site(0, 1)));
        assert!(site(0, 0).touches(&site(0, 5)));
        assert!(!site(0, 0).touches(&site(0, 3)));
        assert!(!site(0, 0).touches(&site(1, 0)));
        let open = CornerSite { closed: false, ..site(0, 0) };
        assert!(!open.touches(&CornerSite { closed: false, ..site(0, 5) }));
    }
}
