//! Selection analysis: where each selected corner's two sides end up.
//!
//! A side is moved by `offset` font units along its own segment, measured
//! by arc length on cubics and by straight distance on lines. The inbound
//! side keeps the first half of its split, the outbound side the second.

use kurbo::{CubicBez, Point};

use crate::error::OverlapError;
use crate::geom::{cubic_arclen, distance, lengthen_line, split_cubic};
use crate::outline::{Contour, Outline, PointId};

/// The cubic a side was cut from and the parameter of the cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSplit {
    pub curve: CubicBez,
    pub t: f64,
}

/// New geometry for one side of a corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideGeometry {
    /// Inbound terminus or outbound origin.
    pub on: Point,
    /// Replacement controls when the side is a cubic.
    pub controls: Option<[Point; 2]>,
    pub split: Option<CurveSplit>,
}

impl SideGeometry {
    pub fn is_curve(&self) -> bool {
        self.split.is_some()
    }
}

/// A selected on-curve point and the new geometry of both its sides.
#[derive(Debug, Clone, PartialEq)]
pub struct Corner {
    pub id: PointId,
    /// Position before the edit.
    pub key: Point,
    pub contour: usize,
    pub segment: usize,
    pub inbound: SideGeometry,
    pub outbound: SideGeometry,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub corners: Vec<Corner>,
    /// Corners that could not be offset, one error each.
    pub rejected: Vec<OverlapError>,
}

impl Analysis {
    pub fn inbound_of(&self, id: PointId) -> Option<&SideGeometry> {
        self.corners.iter().find(|c| c.id == id).map(|c| &c.inbound)
    }

    pub fn outbound_of(&self, id: PointId) -> Option<&SideGeometry> {
        self.corners.iter().find(|c| c.id == id).map(|c| &c.outbound)
    }
}

/// Analyze every selected on-curve point of `outline`.
pub fn analyze(outline: &Outline, offset: f64, accuracy: f64) -> Analysis {
    analyze_contours(outline, None, offset, accuracy)
}

/// Analyze selected on-curve points, limited to `active` contours if given.
pub fn analyze_contours(
    outline: &Outline,
    active: Option<&[usize]>,
    offset: f64,
    accuracy: f64,
) -> Analysis {
    let mut analysis = Analysis::default();
    for (ci, si) in outline.selected_on_curve() {
        if active.is_some_and(|a| !a.contains(&ci)) {
            continue;
        }
        match analyze_corner(&outline.contours[ci], ci, si, offset, accuracy) {
            Ok(corner) => analysis.corners.push(corner),
            Err(err) => analysis.rejected.push(err),
        }
    }
    analysis
}

fn analyze_corner(
    contour: &Contour,
    ci: usize,
    si: usize,
    offset: f64,
    accuracy: f64,
) -> Result<Corner, OverlapError> {
    let seg = &contour.segments()[si];
    let key = seg.on.pos;
    let (Some(start), Some(next)) = (contour.start_of(si), contour.next_index(si)) else {
        return Err(OverlapError::OpenEndpoint { at: key });
    };
    let after = &contour.segments()[next];

    let inbound = match seg.control_positions() {
        Some([c1, c2]) => {
            let curve = CubicBez::new(start, c1, c2, key);
            let t = offset_factor(offset, cubic_arclen(&curve, accuracy), key)?;
            let (head, _) = split_cubic(&curve, t);
            SideGeometry {
                on: head.p3,
                controls: Some([head.p1, head.p2]),
                split: Some(CurveSplit { curve, t }),
            }
        }
        None => {
            let factor = offset_factor(offset, distance(start, key), key)?;
            SideGeometry {
                on: lengthen_line(start, key, factor),
                controls: None,
                split: None,
            }
        }
    };

    let outbound = match after.control_positions() {
        Some([c1, c2]) => {
            let curve = CubicBez::new(key, c1, c2, after.on.pos);
            let t = -(offset_factor(offset, cubic_arclen(&curve, accuracy), key)? - 1.0);
            let (_, tail) = split_cubic(&curve, t);
            SideGeometry {
                on: tail.p0,
                controls: Some([tail.p1, tail.p2]),
                split: Some(CurveSplit { curve, t }),
            }
        }
        None => {
            let t = -(offset_factor(offset, distance(key, after.on.pos), key)? - 1.0);
            SideGeometry {
                on: lengthen_line(key, after.on.pos, t),
                controls: None,
                split: None,
            }
        }
    };

    Ok(Corner {
        id: seg.on.id,
        key,
        contour: ci,
        segment: si,
        inbound,
        outbound,
    })
}

/// `(offset + len) / len`, refusing zero-length sides.
fn offset_factor(offset: f64, len: f64, at: Point) -> Result<f64, OverlapError> {
    if !(len.is_finite() && len > 0.0) {
        return Err(OverlapError::DegenerateSegment { at });
    }
    Ok((offset + len) / len)
}
