//! Cross-overlap: join pairs of split corners crosswise.
//!
//! For a pair `(A, B)` both connectors are removed, leaving four open ends.
//! A's inbound terminus is then joined to B's outbound origin, and B's
//! inbound terminus to A's outbound origin. Two corners on separate
//! contours merge those contours into one; two corners on one contour
//! split it in two. Once every pair is done, line points left on top of
//! their predecessor are removed, and so are contours that collapsed to
//! fewer distinct points than they need.

use std::cmp::Ordering;

use kurbo::Point;
use tracing::{debug, warn};

use crate::error::OverlapError;
use crate::geom::is_continuous;
use crate::outline::{Outline, PointId};

use super::split::{CornerSite, Junction};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrossReport {
    /// Pairs joined successfully.
    pub merged: usize,
    /// Pairs left as plain overlaps, one error each.
    pub skipped: Vec<OverlapError>,
}

/// Pair corners greedily by distance, closest first.
///
/// Corners adjacent on one contour never pair. Ties go to the pair whose
/// first corner comes first in coordinate order, so the result does not
/// depend on the order of `sites`. Returned indices point into `sites`.
pub fn pair_corners(sites: &[CornerSite]) -> Vec<(usize, usize)> {
    let mut remaining: Vec<usize> = (0..sites.len()).collect();
    remaining.sort_by(|&a, &b| cmp_points(sites[a].key, sites[b].key).then(a.cmp(&b)));

    let mut pairs = Vec::with_capacity(sites.len() / 2);
    loop {
        let mut best: Option<(f64, usize, usize)> = None;
        for (i, &a) in remaining.iter().enumerate() {
            for &b in &remaining[i + 1..] {
                if sites[a].touches(&sites[b]) {
                    continue;
                }
                let d = sites[a].key.distance(sites[b].key);
                if best.map_or(true, |(bd, _, _)| d < bd) {
                    best = Some((d, a, b));
                }
            }
        }
        let Some((_, a, b)) = best else {
            break;
        };
        remaining.retain(|&i| i != a && i != b);
        pairs.push((a, b));
    }
    pairs
}

fn cmp_points(a: Point, b: Point) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

/// Join pairs of junctions in `outline`.
///
/// Needs an even number of junctions, at least two. Each pair is tried on
/// a copy and only kept if every contour stays valid. Degenerate geometry
/// is cleaned up after the last pair, since a later pair may still need a
/// point an earlier join left repeated.
pub fn cross_overlap(outline: &mut Outline, junctions: &[Junction], tolerance: f64) -> CrossReport {
    let mut report = CrossReport::default();
    if junctions.len() < 2 || junctions.len() % 2 != 0 {
        debug!(corners = junctions.len(), "cross-overlap needs an even number of corners");
        return report;
    }

    let sites: Vec<CornerSite> = junctions.iter().map(|j| j.site).collect();
    for (a, b) in pair_corners(&sites) {
        let (ja, jb) = (&junctions[a], &junctions[b]);
        let mut trial = outline.clone();
        match merge_pair(&mut trial, ja, jb, tolerance) {
            Ok(()) => {
                *outline = trial;
                report.merged += 1;
            }
            Err(err) => {
                warn!(%err, "cross-overlap pair skipped");
                report.skipped.push(err);
            }
        }
    }
    if report.merged > 0 {
        drop_degenerate(outline);
    }
    report
}

fn drop_degenerate(outline: &mut Outline) {
    let repeated: usize = outline
        .contours
        .iter_mut()
        .map(|c| c.drop_repeated_points())
        .sum();
    let before = outline.contours.len();
    outline.contours.retain(|c| !c.is_degenerate());
    let collapsed = before - outline.contours.len();
    if repeated + collapsed > 0 {
        debug!(repeated, collapsed, "degenerate geometry removed");
    }
}

fn merge_pair(
    outline: &mut Outline,
    a: &Junction,
    b: &Junction,
    tolerance: f64,
) -> Result<(), OverlapError> {
    let unresolved = |reason: &str| OverlapError::UnresolvedPair {
        a: a.site.key,
        b: b.site.key,
        reason: reason.to_string(),
    };

    for j in [a, b] {
        if j.inbound.distance(j.site.key) < 1e-9 || j.outbound.distance(j.site.key) < 1e-9 {
            return Err(unresolved("a side did not move"));
        }
    }

    cut_connector(outline, a).map_err(unresolved)?;
    cut_connector(outline, b).map_err(unresolved)?;
    join(outline, a.corner, b.connector).map_err(unresolved)?;
    join(outline, b.corner, a.connector).map_err(unresolved)?;

    let seams = [
        (a.corner, b.connector, a.inbound_curved || b.outbound_curved),
        (b.corner, a.connector, b.inbound_curved || a.outbound_curved),
    ];
    for (end, start, curved) in seams {
        if !curved {
            prune_seam(outline, end, start, tolerance);
        }
    }

    for contour in &outline.contours {
        contour
            .validate()
            .map_err(|e| unresolved(&format!("joined contour is invalid: {e}")))?;
    }
    Ok(())
}

/// Drop the line from a junction's inbound terminus to its connector.
fn cut_connector(outline: &mut Outline, j: &Junction) -> Result<(), &'static str> {
    let (ci, k) = outline.locate(j.connector).ok_or("connector not found")?;
    let contour = &outline.contours[ci];
    let prev = contour.prev_index(k).ok_or("connector already cut")?;
    if contour.segments()[prev].on.id != j.corner {
        return Err("connector no longer follows its corner");
    }
    let parts = outline.contours.remove(ci).open_before(k);
    for (offset, part) in parts.into_iter().enumerate() {
        outline.contours.insert(ci + offset, part);
    }
    Ok(())
}

/// Join the open contour ending at `end` to the one starting at `start`.
fn join(outline: &mut Outline, end: PointId, start: PointId) -> Result<(), &'static str> {
    let tail = outline
        .contours
        .iter()
        .position(|c| !c.is_closed() && c.segments().last().is_some_and(|s| s.on.id == end));
    let head = outline
        .contours
        .iter()
        .position(|c| !c.is_closed() && c.segments().first().is_some_and(|s| s.on.id == start));
    match (tail, head) {
        (Some(t), Some(h)) if t == h => outline.contours[t].close(),
        (Some(t), Some(h)) => {
            let other = outline.contours.remove(h);
            let t = if h < t { t - 1 } else { t };
            outline.contours[t].append(other);
        }
        _ => return Err("no open end to join"),
    }
    Ok(())
}

/// Remove both seam points when the seam runs straight through them.
fn prune_seam(outline: &mut Outline, end: PointId, start: PointId, tolerance: f64) {
    let Some((ci, k_end)) = outline.locate(end) else {
        return;
    };
    let contour = &mut outline.contours[ci];
    let Some(k_start) = contour.index_of(start) else {
        return;
    };
    let segs = contour.segments();
    let window: Vec<Point> = [
        contour.prev_index(k_end).map(|i| segs[i].on.pos),
        Some(segs[k_end].on.pos),
        Some(segs[k_start].on.pos),
        contour.next_index(k_start).map(|i| segs[i].on.pos),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !is_continuous(&window, tolerance) {
        return;
    }
    for id in [end, start] {
        if let Some(k) = contour.index_of(id) {
            if let Err(err) = contour.remove_line_point(k) {
                debug!(%err, "seam point kept");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlap::analyze::analyze;
    use crate::overlap::split::split_corners;
    use kurbo::BezPath;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> BezPath {
        let mut p = BezPath::new();
        p.move_to((x0, y0));
        p.line_to((x0, y1));
        p.line_to((x1, y1));
        p.line_to((x1, y0));
        p.close_path();
        p
    }

    fn crossed(outline: &Outline, offset: f64) -> (Outline, CrossReport) {
        let (mut out, junctions) = split_corners(outline, &analyze(outline, offset, 1e-3));
        let report = cross_overlap(&mut out, &junctions, 0.1);
        (out, report)
    }

    fn assert_no_repeats(c: &crate::outline::Contour) {
        for k in 0..c.len() {
            let from = c.start_of(k).unwrap();
            assert!(from.distance(c.segments()[k].on.pos) > 1e-9, "zero-length segment {k}");
        }
    }

    fn site(x: f64, y: f64, contour: usize) -> CornerSite {
        CornerSite {
            key: Point::new(x, y),
            contour,
            segment: 0,
            contour_len: 4,
            closed: true,
        }
    }

    #[test]
    fn abutting_rectangles_merge_into_one() {
        let mut outline =
            Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0), rect(100.0, 0.0, 200.0, 100.0)])
                .unwrap();
        assert_eq!(outline.select_at(Point::new(100.0, 100.0)), 2);
        let (out, report) = crossed(&outline, 10.0);
        assert_eq!(report.merged, 1, "{:?}", report.skipped);
        assert_eq!(out.contours.len(), 1);
        let c = &out.contours[0];
        assert!(c.is_closed());
        c.validate().unwrap();
        // The straight seam along y = 100 loses its two overlap points, and
        // the two copies of (100, 0) collapse into one.
        assert_eq!(c.len(), 5);
        assert_no_repeats(c);
        assert!(c
            .on_curve_positions()
            .iter()
            .all(|p| p.y == 0.0 || p.y == 100.0));
    }

    #[test]
    fn abutting_rectangles_sharing_an_edge_become_one_rectangle() {
        let mut outline =
            Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0), rect(100.0, 0.0, 200.0, 100.0)])
                .unwrap();
        assert_eq!(outline.select_at(Point::new(100.0, 100.0)), 2);
        assert_eq!(outline.select_at(Point::new(100.0, 0.0)), 2);
        let (out, report) = crossed(&outline, 10.0);
        assert_eq!(report.merged, 2, "{:?}", report.skipped);
        assert_eq!(out.contours.len(), 1);
        let c = &out.contours[0];
        assert!(c.is_closed());
        assert!(!c.is_degenerate());
        assert_no_repeats(c);
        let mut corners = c.on_curve_positions();
        corners.sort_by(|a, b| cmp_points(*a, *b));
        assert_eq!(
            corners,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.0, 100.0),
                Point::new(200.0, 0.0),
                Point::new(200.0, 100.0),
            ]
        );
    }

    #[test]
    fn opposite_corners_of_one_contour_split_it() {
        let mut outline = Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0)]).unwrap();
        outline.select_at(Point::ZERO);
        outline.select_at(Point::new(100.0, 100.0));
        let (out, report) = crossed(&outline, 10.0);
        assert_eq!(report.merged, 1);
        assert_eq!(out.contours.len(), 2);
        for c in &out.contours {
            assert!(c.is_closed());
            c.validate().unwrap();
        }
    }

    #[test]
    fn odd_corner_count_is_left_alone() {
        let mut outline = Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0)]).unwrap();
        outline.select_at(Point::ZERO);
        let (split, _) = split_corners(&outline, &analyze(&outline, 10.0, 1e-3));
        let (out, report) = crossed(&outline, 10.0);
        assert_eq!(report, CrossReport::default());
        assert_eq!(out, split);
    }

    #[test]
    fn adjacent_corners_do_not_pair() {
        let mut outline = Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0)]).unwrap();
        outline.select_at(Point::ZERO);
        outline.select_at(Point::new(0.0, 100.0));
        let (out, report) = crossed(&outline, 10.0);
        assert_eq!(report.merged, 0);
        assert_eq!(out.contours.len(), 1);
        assert_eq!(out.on_curve_count(), 6);
    }

    #[test]
    fn zero_offset_pair_is_unresolved() {
        let mut outline =
            Outline::from_bezpaths(&[rect(0.0, 0.0, 100.0, 100.0), rect(100.0, 0.0, 200.0, 100.0)])
                .unwrap();
        outline.select_at(Point::new(100.0, 100.0));
        let (out, report) = crossed(&outline, 0.0);
        assert_eq!(report.merged, 0);
        assert!(matches!(
            report.skipped.as_slice(),
            [OverlapError::UnresolvedPair { .. }]
        ));
        assert_eq!(out.contours.len(), 2);
    }

    #[test]
    fn pairing_is_closest_first_and_order_independent() {
        let sites = vec![
            site(0.0, 0.0, 0),
            site(1.0, 0.0, 1),
            site(10.0, 0.0, 2),
            site(11.0, 0.0, 3),
        ];
        let keys = |sites: &[CornerSite]| {
            let mut pairs: Vec<(Point, Point)> = pair_corners(sites)
                .into_iter()
                .map(|(a, b)| (sites[a].key, sites[b].key))
                .collect();
            pairs.sort_by(|x, y| cmp_points(x.0, y.0));
            pairs
        };
        let expected = vec![
            (Point::new(0.0, 0.0), Point::new(1.0, 0.0)),
            (Point::new(10.0, 0.0), Point::new(11.0, 0.0)),
        ];
        assert_eq!(keys(&sites), expected);

        let shuffled = vec![sites[3], sites[0], sites[2], sites[1]];
        assert_eq!(keys(&shuffled), expected);
        let reversed: Vec<CornerSite> = sites.iter().rev().copied().collect();
        assert_eq!(keys(&reversed), expected);
    }

    #[test]
    fn corners_without_partner_stay_unpaired() {
        let sites = vec![
            CornerSite { segment: 0, ..site(0.0, 0.0, 0) },
            CornerSite { segment: 1, ..site(0.0, 5.0, 0) },
        ];
        assert!(pair_corners(&sites).is_empty());
    }
}
