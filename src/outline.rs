//! Editable outline value types.
//!
//! A contour is a sequence of segments, each ending at one on-curve point
//! and carrying either no controls (line) or two off-curve controls
//! (cubic). A segment starts at the previous segment's on-curve point;
//! closed contours wrap, open contours start with a `Move` segment.
//!
//! Points carry a stable [`PointId`] so that two points sharing a
//! position during editing are never confused with one another.

use kurbo::{BezPath, PathEl, Point};
use norad::{Component, Name};

use crate::error::OverlapError;

/// Positions closer than this are treated as equal.
const SAME_POINT_EPSILON: f64 = 1e-9;

/// Stable identity of a point, unique within one [`Outline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(u64);

/// Allocator for fresh point ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointIds {
    next: u64,
}

impl PointIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator whose ids never collide with any id in `contours`.
    fn after(contours: &[Contour]) -> Self {
        let next = contours
            .iter()
            .flat_map(|c| c.points())
            .map(|p| p.id.0 + 1)
            .max()
            .unwrap_or(0);
        Self { next }
    }

    pub fn fresh(&mut self) -> PointId {
        let id = PointId(self.next);
        self.next += 1;
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointKind {
    /// First point of an open contour.
    Move,
    Line,
    Curve,
    OffCurve,
}

impl PointKind {
    pub fn is_on_curve(self) -> bool {
        self != PointKind::OffCurve
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlinePoint {
    pub id: PointId,
    pub pos: Point,
    pub kind: PointKind,
    pub smooth: bool,
    pub selected: bool,
    /// Host point name, carried through edits untouched.
    pub name: Option<Name>,
}

impl OutlinePoint {
    pub fn new(id: PointId, pos: impl Into<Point>, kind: PointKind) -> Self {
        Self {
            id,
            pos: pos.into(),
            kind,
            smooth: false,
            selected: false,
            name: None,
        }
    }

    pub fn with_smooth(mut self, smooth: bool) -> Self {
        self.smooth = smooth;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub controls: Option<[OutlinePoint; 2]>,
    pub on: OutlinePoint,
}

impl Segment {
    pub fn line(on: OutlinePoint) -> Self {
        Self { controls: None, on }
    }

    pub fn curve(c1: OutlinePoint, c2: OutlinePoint, on: OutlinePoint) -> Self {
        Self {
            controls: Some([c1, c2]),
            on,
        }
    }

    pub fn is_curve(&self) -> bool {
        self.controls.is_some()
    }

    /// Control positions, if this is a cubic.
    pub fn control_positions(&self) -> Option<[Point; 2]> {
        self.controls.as_ref().map(|[a, b]| [a.pos, b.pos])
    }

    /// Points in outline order: controls first, then the on-curve point.
    pub fn points(&self) -> impl Iterator<Item = &OutlinePoint> {
        self.controls
            .iter()
            .flat_map(|c| c.iter())
            .chain(std::iter::once(&self.on))
    }

    /// Turn this segment into the start of an open contour.
    fn into_move(mut self) -> Self {
        self.controls = None;
        self.on.kind = PointKind::Move;
        self.on.smooth = false;
        self
    }

    /// Turn an open contour's start into a line segment.
    fn into_line(mut self) -> Self {
        self.demote_move();
        self
    }

    fn demote_move(&mut self) {
        if self.on.kind == PointKind::Move {
            self.on.kind = PointKind::Line;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    segments: Vec<Segment>,
    closed: bool,
}

impl Contour {
    /// Build a validated contour.
    pub fn new(segments: Vec<Segment>, closed: bool) -> Result<Self, OverlapError> {
        let contour = Self { segments, closed };
        contour.validate()?;
        Ok(contour)
    }

    /// Check the structural invariants every edit must preserve.
    pub fn validate(&self) -> Result<(), OverlapError> {
        if self.segments.is_empty() {
            return Err(OverlapError::EmptyContour);
        }
        for (i, seg) in self.segments.iter().enumerate() {
            let is_start = !self.closed && i == 0;
            match (is_start, seg.on.kind, &seg.controls) {
                (true, PointKind::Move, None) => {}
                (true, kind, _) => {
                    return Err(OverlapError::InvalidContour(format!(
                        "open contour starts with {kind:?} instead of a bare move"
                    )))
                }
                (false, PointKind::Line, None) | (false, PointKind::Curve, Some(_)) => {}
                (false, kind, controls) => {
                    return Err(OverlapError::InvalidContour(format!(
                        "segment {i} is {kind:?} with {} controls",
                        if controls.is_some() { 2 } else { 0 }
                    )))
                }
            }
            if let Some(controls) = &seg.controls {
                if controls.iter().any(|c| c.kind != PointKind::OffCurve) {
                    return Err(OverlapError::InvalidContour(format!(
                        "segment {i} has an on-curve control point"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub(crate) fn segments_mut(&mut self) -> &mut Vec<Segment> {
        &mut self.segments
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Index of the segment before `i`; wraps on closed contours.
    pub fn prev_index(&self, i: usize) -> Option<usize> {
        match (i, self.closed) {
            (0, true) => self.segments.len().checked_sub(1),
            (0, false) => None,
            _ => Some(i - 1),
        }
    }

    /// Index of the segment after `i`; wraps on closed contours.
    pub fn next_index(&self, i: usize) -> Option<usize> {
        if i + 1 < self.segments.len() {
            Some(i + 1)
        } else if self.closed {
            Some(0)
        } else {
            None
        }
    }

    /// Where segment `i` starts: the previous segment's on-curve point.
    pub fn start_of(&self, i: usize) -> Option<Point> {
        self.prev_index(i).map(|p| self.segments[p].on.pos)
    }

    /// Index of the segment whose on-curve point is `id`.
    pub fn index_of(&self, id: PointId) -> Option<usize> {
        self.segments.iter().position(|s| s.on.id == id)
    }

    /// Every point, in segment order.
    pub fn points(&self) -> impl Iterator<Item = &OutlinePoint> {
        self.segments.iter().flat_map(|s| s.points())
    }

    pub fn points_mut(&mut self) -> impl Iterator<Item = &mut OutlinePoint> {
        self.segments.iter_mut().flat_map(|s| {
            s.controls
                .iter_mut()
                .flat_map(|c| c.iter_mut())
                .chain(std::iter::once(&mut s.on))
        })
    }

    pub fn on_curve_positions(&self) -> Vec<Point> {
        self.segments.iter().map(|s| s.on.pos).collect()
    }

    /// Convert a `kurbo::BezPath` holding a single subpath.
    ///
    /// Closed paths follow the UFO convention: the first point takes the
    /// closing segment's type, and a last on-curve point that duplicates
    /// the MoveTo is folded into it.
    pub fn from_bezpath(path: &BezPath, ids: &mut PointIds) -> Result<Self, OverlapError> {
        let elements = path.elements();
        let first = match elements.first() {
            Some(PathEl::MoveTo(p)) => *p,
            Some(_) => {
                return Err(OverlapError::InvalidContour(
                    "path must start with MoveTo".into(),
                ))
            }
            None => return Err(OverlapError::EmptyContour),
        };

        let mut rest: Vec<Segment> = Vec::new();
        let mut closed = false;
        for el in elements.iter().skip(1) {
            match *el {
                PathEl::LineTo(p) => {
                    rest.push(Segment::line(OutlinePoint::new(ids.fresh(), p, PointKind::Line)));
                }
                PathEl::CurveTo(a, b, p) => {
                    rest.push(Segment::curve(
                        OutlinePoint::new(ids.fresh(), a, PointKind::OffCurve),
                        OutlinePoint::new(ids.fresh(), b, PointKind::OffCurve),
                        OutlinePoint::new(ids.fresh(), p, PointKind::Curve),
                    ));
                }
                PathEl::QuadTo(..) => {
                    return Err(OverlapError::Unsupported("quadratic segments".into()))
                }
                PathEl::ClosePath => closed = true,
                PathEl::MoveTo(_) => {
                    return Err(OverlapError::InvalidContour(
                        "unexpected MoveTo mid-path".into(),
                    ))
                }
            }
        }

        let start_id = ids.fresh();
        if !closed {
            let mut segments = vec![Segment::line(OutlinePoint::new(start_id, first, PointKind::Move))];
            segments.extend(rest);
            return Self::new(segments, false);
        }

        let returns_home = rest
            .last()
            .is_some_and(|s| s.on.pos.distance(first) < SAME_POINT_EPSILON);
        let closing = if returns_home { rest.pop() } else { None };
        let head = match closing {
            Some(Segment { controls: Some(controls), on }) => Segment {
                controls: Some(controls),
                on: OutlinePoint { id: start_id, pos: first, ..on },
            },
            _ => Segment::line(OutlinePoint::new(start_id, first, PointKind::Line)),
        };
        let mut segments = vec![head];
        segments.extend(rest);
        Self::new(segments, true)
    }

    pub fn to_bezpath(&self) -> BezPath {
        let mut path = BezPath::new();
        let Some(head) = self.segments.first() else {
            return path;
        };
        path.move_to(head.on.pos);
        for seg in &self.segments[1..] {
            push_segment(&mut path, seg);
        }
        if self.closed {
            if head.is_curve() {
                push_segment(&mut path, head);
            }
            path.close_path();
        }
        path
    }

    /// Open the contour just before segment `k`, dropping that segment's
    /// incoming edge.
    ///
    /// A closed contour becomes one open contour starting at segment `k`'s
    /// on-curve point and ending at the point before it. An open contour
    /// splits in two. Cutting an open contour at its start is a no-op.
    pub(crate) fn open_before(self, k: usize) -> Vec<Contour> {
        let Contour { mut segments, closed } = self;
        if closed {
            segments.rotate_left(k);
            let mut iter = segments.into_iter();
            let mut rotated = Vec::with_capacity(iter.len());
            if let Some(head) = iter.next() {
                rotated.push(head.into_move());
            }
            rotated.extend(iter);
            return vec![Contour { segments: rotated, closed: false }];
        }
        if k == 0 {
            return vec![Contour { segments, closed }];
        }
        let tail = segments.split_off(k);
        let mut iter = tail.into_iter();
        let mut right = Vec::with_capacity(iter.len());
        if let Some(head) = iter.next() {
            right.push(head.into_move());
        }
        right.extend(iter);
        vec![
            Contour { segments, closed: false },
            Contour { segments: right, closed: false },
        ]
    }

    /// Append an open contour onto the end of this open one, joining them
    /// with a line from this contour's last point to `other`'s first.
    pub(crate) fn append(&mut self, other: Contour) {
        let mut iter = other.segments.into_iter();
        if let Some(head) = iter.next() {
            self.segments.push(head.into_line());
        }
        self.segments.extend(iter);
    }

    /// Close an open contour with a line from its last point to its first.
    pub(crate) fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(head) = self.segments.first_mut() {
            head.demote_move();
        }
        self.closed = true;
    }

    /// Remove the on-curve point of line segment `k`. The following
    /// segment keeps its controls and now starts one point earlier.
    pub(crate) fn remove_line_point(&mut self, k: usize) -> Result<(), OverlapError> {
        let seg = self
            .segments
            .get(k)
            .ok_or_else(|| OverlapError::InvalidContour(format!("no segment {k}")))?;
        if seg.is_curve() || seg.on.kind == PointKind::Move {
            return Err(OverlapError::InvalidContour(format!(
                "segment {k} is not a removable line point"
            )));
        }
        let min_len = if self.closed { 3 } else { 2 };
        if self.segments.len() < min_len {
            return Err(OverlapError::InvalidContour(
                "contour too short to remove a point".into(),
            ));
        }
        self.segments.remove(k);
        Ok(())
    }

    /// Remove line points that repeat the on-curve point before them.
    /// Returns how many were removed.
    pub(crate) fn drop_repeated_points(&mut self) -> usize {
        let mut removed = 0;
        let mut k = 0;
        while k < self.segments.len() {
            let seg = &self.segments[k];
            let repeats = !seg.is_curve()
                && seg.on.kind != PointKind::Move
                && self
                    .start_of(k)
                    .is_some_and(|p| p.distance(seg.on.pos) < SAME_POINT_EPSILON);
            if repeats && self.remove_line_point(k).is_ok() {
                removed += 1;
            } else {
                k += 1;
            }
        }
        removed
    }

    /// Too few distinct on-curve points to enclose or span anything: two
    /// for open contours and closed curved ones, three for closed polygons.
    pub fn is_degenerate(&self) -> bool {
        let mut distinct: Vec<Point> = Vec::with_capacity(self.segments.len());
        for p in self.on_curve_positions() {
            if !distinct.iter().any(|q| q.distance(p) < SAME_POINT_EPSILON) {
                distinct.push(p);
            }
        }
        let needed = if self.closed && !self.segments.iter().any(Segment::is_curve) {
            3
        } else {
            2
        };
        distinct.len() < needed
    }
}

fn push_segment(path: &mut BezPath, seg: &Segment) {
    match seg.control_positions() {
        Some([a, b]) => path.curve_to(a, b, seg.on.pos),
        None => path.line_to(seg.on.pos),
    }
}

/// A glyph's contours plus its component references.
///
/// Components are host values carried through every edit verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub contours: Vec<Contour>,
    pub components: Vec<Component>,
    ids: PointIds,
}

impl Outline {
    pub fn new(contours: Vec<Contour>, components: Vec<Component>) -> Self {
        let ids = PointIds::after(&contours);
        Self { contours, components, ids }
    }

    /// Build an outline from one BezPath per contour.
    pub fn from_bezpaths(paths: &[BezPath]) -> Result<Self, OverlapError> {
        let mut ids = PointIds::new();
        let contours = paths
            .iter()
            .map(|p| Contour::from_bezpath(p, &mut ids))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { contours, components: Vec::new(), ids })
    }

    pub fn to_bezpaths(&self) -> Vec<BezPath> {
        self.contours.iter().map(Contour::to_bezpath).collect()
    }

    pub fn fresh_id(&mut self) -> PointId {
        self.ids.fresh()
    }

    /// `(contour, segment)` of the on-curve point `id`.
    pub fn locate(&self, id: PointId) -> Option<(usize, usize)> {
        self.contours
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.index_of(id).map(|si| (ci, si)))
    }

    /// Select every on-curve point at `pos`. Returns how many matched.
    pub fn select_at(&mut self, pos: Point) -> usize {
        let mut hits = 0;
        for contour in &mut self.contours {
            for seg in contour.segments_mut() {
                if seg.on.pos.distance(pos) < SAME_POINT_EPSILON {
                    seg.on.selected = true;
                    hits += 1;
                }
            }
        }
        hits
    }

    /// `(contour, segment)` of every selected on-curve point.
    pub fn selected_on_curve(&self) -> Vec<(usize, usize)> {
        self.contours
            .iter()
            .enumerate()
            .flat_map(|(ci, c)| {
                c.segments()
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.on.selected)
                    .map(move |(si, _)| (ci, si))
            })
            .collect()
    }

    /// Indices of contours holding at least one selected point.
    pub fn selected_contours(&self) -> Vec<usize> {
        self.contours
            .iter()
            .enumerate()
            .filter(|(_, c)| c.points().any(|p| p.selected))
            .map(|(i, _)| i)
            .collect()
    }

    /// Copy of the given contours only, without components. Point ids
    /// are preserved and the allocator stays ahead of them.
    pub fn subset(&self, indices: &[usize]) -> Outline {
        let contours = indices
            .iter()
            .filter_map(|&i| self.contours.get(i).cloned())
            .collect();
        Outline {
            contours,
            components: Vec::new(),
            ids: self.ids.clone(),
        }
    }

    pub fn on_curve_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }
}
