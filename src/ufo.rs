//! UFO glyph boundary: `norad` contours in and out, and a
//! [`GlyphHost`] backed by a `norad::Glyph`.

use std::collections::BTreeSet;

use kurbo::Point;
use norad::{Component, ContourPoint, Glyph, PointType};
use tracing::debug;

use crate::commit::{CommitPlan, Slot};
use crate::error::OverlapError;
use crate::outline::{Contour, Outline, OutlinePoint, PointIds, PointKind, Segment};
use crate::session::GlyphHost;

/// Convert a `norad::Contour`. `selected(i)` tells whether point `i` of
/// the UFO point list is selected.
///
/// Closed contours may start anywhere; leading off-curve points become the
/// controls of the closing segment.
pub fn from_contour(
    contour: &norad::Contour,
    selected: impl Fn(usize) -> bool,
    ids: &mut PointIds,
) -> Result<Contour, OverlapError> {
    let pts = &contour.points;
    let first = pts.first().ok_or(OverlapError::EmptyContour)?;
    let closed = first.typ != PointType::Move;

    let order: Vec<usize> = if closed {
        let start = pts
            .iter()
            .position(|p| p.typ != PointType::OffCurve)
            .ok_or_else(|| OverlapError::Unsupported("contour without on-curve points".into()))?;
        (start..pts.len()).chain(0..start).collect()
    } else {
        (0..pts.len()).collect()
    };

    let mut pending: Vec<OutlinePoint> = Vec::new();
    let mut segments: Vec<Segment> = Vec::new();
    for i in order {
        let p = &pts[i];
        let kind = match p.typ {
            PointType::Move => PointKind::Move,
            PointType::Line => PointKind::Line,
            PointType::Curve => PointKind::Curve,
            PointType::OffCurve => PointKind::OffCurve,
            PointType::QCurve => {
                return Err(OverlapError::Unsupported("quadratic segments".into()))
            }
        };
        let mut point = OutlinePoint::new(ids.fresh(), (p.x, p.y), kind).with_smooth(p.smooth);
        point.selected = selected(i);
        point.name = p.name.clone();
        if kind == PointKind::OffCurve {
            pending.push(point);
            continue;
        }
        let controls = take_controls(&mut pending)?;
        segments.push(Segment { controls, on: point });
    }

    if closed {
        let trailing = take_controls(&mut pending)?;
        if let Some(head) = segments.first_mut() {
            head.controls = trailing;
        }
    } else if !pending.is_empty() {
        return Err(OverlapError::InvalidContour(
            "open contour ends in off-curve points".into(),
        ));
    }
    Contour::new(segments, closed)
}

fn take_controls(pending: &mut Vec<OutlinePoint>) -> Result<Option<[OutlinePoint; 2]>, OverlapError> {
    if pending.is_empty() {
        return Ok(None);
    }
    <[OutlinePoint; 2]>::try_from(std::mem::take(pending))
        .map(Some)
        .map_err(|v| OverlapError::Unsupported(format!("{} off-curve points in one segment", v.len())))
}

/// Convert back to a `norad::Contour`, starting on an on-curve point.
pub fn to_contour(contour: &Contour) -> norad::Contour {
    let segs = contour.segments();
    let mut points: Vec<ContourPoint> = Vec::with_capacity(segs.len() * 3);
    match segs.split_first() {
        Some((head, rest)) if contour.is_closed() => {
            points.push(contour_point(&head.on));
            points.extend(rest.iter().flat_map(|s| s.points()).map(contour_point));
            if let Some(controls) = &head.controls {
                points.extend(controls.iter().map(contour_point));
            }
        }
        _ => points.extend(contour.points().map(contour_point)),
    }
    norad::Contour::new(points, None)
}

fn contour_point(p: &OutlinePoint) -> ContourPoint {
    let typ = match p.kind {
        PointKind::Move => PointType::Move,
        PointKind::Line => PointType::Line,
        PointKind::Curve => PointType::Curve,
        PointKind::OffCurve => PointType::OffCurve,
    };
    ContourPoint::new(p.pos.x, p.pos.y, typ, p.smooth, p.name.clone(), None)
}

struct Snapshot {
    label: String,
    contours: Vec<norad::Contour>,
    components: Vec<Component>,
}

/// An editable `norad::Glyph` with a point selection and undo stack.
pub struct UfoGlyph {
    glyph: Glyph,
    /// `(contour, point)` indices into the UFO point lists.
    selection: BTreeSet<(usize, usize)>,
    snap_grid: f64,
    undo: Vec<Snapshot>,
    revision: u64,
}

impl UfoGlyph {
    pub fn new(glyph: Glyph) -> Self {
        Self {
            glyph,
            selection: BTreeSet::new(),
            snap_grid: 0.0,
            undo: Vec::new(),
            revision: 0,
        }
    }

    pub fn with_snap_grid(mut self, grid: f64) -> Self {
        self.snap_grid = grid;
        self
    }

    pub fn glyph(&self) -> &Glyph {
        &self.glyph
    }

    pub fn into_glyph(self) -> Glyph {
        self.glyph
    }

    /// Bumped by every edit, undo included.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Select point `index` of contour `contour`.
    pub fn select_point(&mut self, contour: usize, index: usize) -> Result<(), OverlapError> {
        let exists = self
            .glyph
            .contours
            .get(contour)
            .is_some_and(|c| index < c.points.len());
        if !exists {
            return Err(OverlapError::InvalidContour(format!(
                "no point {index} in contour {contour}"
            )));
        }
        self.selection.insert((contour, index));
        Ok(())
    }

    /// Select every on-curve point at `pos`. Returns how many matched.
    pub fn select_at(&mut self, pos: Point) -> usize {
        let mut hits = 0;
        for (ci, contour) in self.glyph.contours.iter().enumerate() {
            for (pi, p) in contour.points.iter().enumerate() {
                if p.typ != PointType::OffCurve && Point::new(p.x, p.y).distance(pos) < 1e-9 {
                    self.selection.insert((ci, pi));
                    hits += 1;
                }
            }
        }
        hits
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Revert the last edit. Returns its label.
    pub fn undo(&mut self) -> Option<String> {
        let snapshot = self.undo.pop()?;
        self.glyph.contours = snapshot.contours;
        self.glyph.components = snapshot.components;
        self.selection.clear();
        self.revision += 1;
        Some(snapshot.label)
    }

    fn push_undo(&mut self, label: impl Into<String>) {
        self.undo.push(Snapshot {
            label: label.into(),
            contours: self.glyph.contours.clone(),
            components: self.glyph.components.clone(),
        });
    }
}

impl GlyphHost for UfoGlyph {
    fn read_outline(&self) -> Result<Outline, OverlapError> {
        let mut ids = PointIds::new();
        let contours = self
            .glyph
            .contours
            .iter()
            .enumerate()
            .map(|(ci, c)| from_contour(c, |pi| self.selection.contains(&(ci, pi)), &mut ids))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Outline::new(contours, self.glyph.components.clone()))
    }

    fn snap_grid(&self) -> f64 {
        self.snap_grid
    }

    fn normalize_start_points(&mut self, contours: &[usize]) -> Result<bool, OverlapError> {
        let needs_turn: Vec<(usize, usize)> = contours
            .iter()
            .filter_map(|&ci| {
                let points = &self.glyph.contours.get(ci)?.points;
                if points.first()?.typ != PointType::OffCurve {
                    return None;
                }
                let k = points.iter().position(|p| p.typ != PointType::OffCurve)?;
                Some((ci, k))
            })
            .collect();
        if needs_turn.is_empty() {
            return Ok(false);
        }

        self.push_undo("Start contours on on-curve points");
        for &(ci, k) in &needs_turn {
            let points = &mut self.glyph.contours[ci].points;
            let len = points.len();
            points.rotate_left(k);
            self.selection = std::mem::take(&mut self.selection)
                .into_iter()
                .map(|(c, i)| if c == ci { (c, (i + len - k) % len) } else { (c, i) })
                .collect();
        }
        self.revision += 1;
        debug!(contours = needs_turn.len(), "rotated contour start points");
        Ok(true)
    }

    fn apply(&mut self, plan: CommitPlan) -> Result<(), OverlapError> {
        if plan.slots.len() != self.glyph.contours.len() {
            return Err(OverlapError::Commit(format!(
                "plan covers {} contours, glyph has {}",
                plan.slots.len(),
                self.glyph.contours.len()
            )));
        }
        let mut contours = Vec::with_capacity(plan.contour_count());
        for (slot, existing) in plan.slots.iter().zip(&self.glyph.contours) {
            match slot {
                Slot::Keep => contours.push(existing.clone()),
                Slot::Replace(list) => contours.extend(list.iter().map(to_contour)),
            }
        }

        self.push_undo(plan.label);
        self.glyph.contours = contours;
        self.glyph.components = plan.components;
        self.selection.clear();
        self.revision += 1;
        Ok(())
    }
}
