//! The hotkey-and-drag gesture.
//!
//! Holding the hotkey arms the tool and captures the selected contours.
//! Moving the pointer sets the offset to half the horizontal distance
//! travelled since the first move, and each change rebuilds the preview.
//! Releasing the hotkey commits the last preview as a single edit.
//!
//! The host editor sits behind two traits: [`GlyphHost`] for reading and
//! writing the glyph, and [`PreviewSink`] for drawing the preview.

use std::fmt;

use norad::Component;
use tracing::{debug, error, info};

use crate::commit::{build_plan, CommitPlan};
use crate::config::{OverlapConfig, Rgba};
use crate::error::OverlapError;
use crate::outline::Outline;
use crate::overlap::{overlap, Overlapped};

/// The glyph being edited.
pub trait GlyphHost {
    /// Current contours, selection and components.
    fn read_outline(&self) -> Result<Outline, OverlapError>;

    /// Grid for committed coordinates. 0 defers to the tool's config.
    fn snap_grid(&self) -> f64 {
        0.0
    }

    /// Rotate the given closed contours so each starts on an on-curve
    /// point. Returns whether anything changed.
    fn normalize_start_points(&mut self, _contours: &[usize]) -> Result<bool, OverlapError> {
        Ok(false)
    }

    /// Apply `plan` as one undoable edit, or not at all.
    fn apply(&mut self, plan: CommitPlan) -> Result<(), OverlapError>;
}

/// Receives preview updates while a drag is in progress.
pub trait PreviewSink {
    fn preview_updated(&mut self, _outline: &Outline, _stroke: Rgba) {}
    fn preview_stopped(&mut self) {}
}

impl PreviewSink for () {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub option: bool,
    pub control: bool,
    pub command: bool,
}

impl Modifiers {
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        option: false,
        control: false,
        command: false,
    };

    /// Option, Control and Command keep the hotkey from arming the tool.
    pub fn blocks_hotkey(&self) -> bool {
        self.option || self.control || self.command
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Hotkey held, pointer not yet moved.
    Armed,
    Dragging,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Overlapping,
    Chamfering,
    CrossOverlapping,
}

impl Mode {
    pub fn label(self) -> &'static str {
        match self {
            Mode::Overlapping => "Overlapping",
            Mode::Chamfering => "Chamfering",
            Mode::CrossOverlapping => "Cross-overlapping",
        }
    }

    fn undo_label(self) -> &'static str {
        match self {
            Mode::Overlapping => "Overlap",
            Mode::Chamfering => "Chamfer",
            Mode::CrossOverlapping => "Cross-overlap",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What to show the user after a preview rebuild.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Status {
    pub mode: Mode,
    pub offset: f64,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.mode, self.offset)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Committed {
        contours_before: usize,
        contours_after: usize,
    },
    /// The gesture ended at offset 0; the glyph was not touched.
    Unchanged,
    /// No gesture was in progress.
    Inactive,
}

/// Offset for a pointer at `current` when the drag started at `origin`.
pub fn drag_offset(origin: f64, current: f64) -> f64 {
    ((current.trunc() - origin.trunc()) / 2.0).trunc()
}

struct Session {
    document: Outline,
    selected: Vec<usize>,
    scope: Outline,
    components: Vec<Component>,
    grid: f64,
    origin: Option<f64>,
    offset: f64,
    preview: Option<Overlapped>,
    mode: Mode,
}

/// The tool. One instance per editor window.
pub struct Overlapper {
    config: OverlapConfig,
    modifiers: Modifiers,
    session: Option<Session>,
}

impl Overlapper {
    pub fn new(config: OverlapConfig) -> Self {
        Self {
            config,
            modifiers: Modifiers::default(),
            session: None,
        }
    }

    pub fn config(&self) -> &OverlapConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        match &self.session {
            None => Phase::Idle,
            Some(s) if s.origin.is_none() => Phase::Armed,
            Some(_) => Phase::Dragging,
        }
    }

    pub fn offset(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.offset)
    }

    /// The current preview, while a gesture is in progress.
    pub fn preview(&self) -> Option<&Outline> {
        self.session
            .as_ref()
            .and_then(|s| s.preview.as_ref())
            .map(|p| &p.outline)
    }

    /// Arm the tool if `key` is the hotkey and something is selected.
    pub fn key_down<H, S>(
        &mut self,
        host: &mut H,
        sink: &mut S,
        key: char,
        modifiers: Modifiers,
    ) -> Result<Option<Status>, OverlapError>
    where
        H: GlyphHost + ?Sized,
        S: PreviewSink + ?Sized,
    {
        self.modifiers = modifiers;
        if self.session.is_some() || !self.config.is_hotkey(key) || modifiers.blocks_hotkey() {
            return Ok(None);
        }

        let mut document = host.read_outline()?;
        if document.selected_on_curve().is_empty() {
            debug!("hotkey pressed with nothing selected");
            return Ok(None);
        }
        let selected = document.selected_contours();
        if host.normalize_start_points(&selected)? {
            debug!("contour start points moved onto on-curve points");
            document = host.read_outline()?;
        }
        let selected = document.selected_contours();
        let scope = document.subset(&selected);
        let components = document.components.clone();
        let grid = match host.snap_grid() {
            g if g > 0.0 => g,
            _ => self.config.snap_grid,
        };
        debug!(contours = selected.len(), "overlap armed");

        self.session = Some(Session {
            document,
            selected,
            scope,
            components,
            grid,
            origin: None,
            offset: 0.0,
            preview: None,
            mode: Mode::Overlapping,
        });
        Ok(self.rebuild(sink))
    }

    pub fn modifiers_changed<S>(&mut self, sink: &mut S, modifiers: Modifiers) -> Option<Status>
    where
        S: PreviewSink + ?Sized,
    {
        let shift_changed = self.modifiers.shift != modifiers.shift;
        self.modifiers = modifiers;
        if shift_changed {
            self.rebuild(sink)
        } else {
            None
        }
    }

    /// Track the pointer. The first move after arming sets the origin.
    pub fn mouse_moved<S>(&mut self, sink: &mut S, x: f64) -> Option<Status>
    where
        S: PreviewSink + ?Sized,
    {
        let session = self.session.as_mut()?;
        let origin = *session.origin.get_or_insert(x);
        let offset = drag_offset(origin, x);
        if offset == session.offset && session.preview.is_some() {
            return None;
        }
        session.offset = offset;
        self.rebuild(sink)
    }

    /// End the gesture on hotkey release and commit the last preview.
    ///
    /// Offset 0 is the cancel path: dragging back to the start and releasing
    /// returns [`CommitOutcome::Unchanged`] without writing to the host.
    /// A failed commit is logged and returned; the glyph is left as it was.
    pub fn key_up<H, S>(
        &mut self,
        host: &mut H,
        sink: &mut S,
        key: char,
    ) -> Result<CommitOutcome, OverlapError>
    where
        H: GlyphHost + ?Sized,
        S: PreviewSink + ?Sized,
    {
        if !self.config.is_hotkey(key) {
            return Ok(CommitOutcome::Inactive);
        }
        let Some(session) = self.session.take() else {
            return Ok(CommitOutcome::Inactive);
        };
        sink.preview_stopped();
        let result = self.commit(host, session);
        if let Err(err) = &result {
            error!(%err, "overlap commit abandoned");
        }
        result
    }

    fn commit<H>(&self, host: &mut H, session: Session) -> Result<CommitOutcome, OverlapError>
    where
        H: GlyphHost + ?Sized,
    {
        if session.offset == 0.0 {
            return Ok(CommitOutcome::Unchanged);
        }
        let preview = match session.preview {
            Some(p) => p,
            None => overlap(&session.scope, session.offset, self.modifiers.shift, &self.config),
        };
        let plan = build_plan(
            &session.document,
            &session.selected,
            &preview.outline,
            session.components,
            session.grid,
            session.mode.undo_label(),
        )?;
        let contours_before = session.document.contours.len();
        let contours_after = plan.contour_count();
        host.apply(plan)?;
        info!(
            offset = session.offset,
            mode = %session.mode,
            contours_before,
            contours_after,
            "overlap committed"
        );
        Ok(CommitOutcome::Committed {
            contours_before,
            contours_after,
        })
    }

    fn rebuild<S>(&mut self, sink: &mut S) -> Option<Status>
    where
        S: PreviewSink + ?Sized,
    {
        let cross = self.modifiers.shift;
        let session = self.session.as_mut()?;
        let built = overlap(&session.scope, session.offset, cross, &self.config);
        sink.preview_updated(&built.outline, self.config.preview_stroke);
        session.mode = if cross && built.cross_succeeded() {
            Mode::CrossOverlapping
        } else if session.offset < 0.0 {
            Mode::Chamfering
        } else {
            Mode::Overlapping
        };
        session.preview = Some(built);
        Some(Status {
            mode: session.mode,
            offset: session.offset,
        })
    }
}

/// Run one whole gesture without a pointer: press the hotkey, drag
/// `2 * offset` units to the right, release.
pub fn replay<H>(
    host: &mut H,
    config: &OverlapConfig,
    offset: i32,
    cross: bool,
) -> Result<CommitOutcome, OverlapError>
where
    H: GlyphHost + ?Sized,
{
    let mut tool = Overlapper::new(config.clone());
    let modifiers = Modifiers {
        shift: cross,
        ..Modifiers::default()
    };
    let sink = &mut ();
    if tool.key_down(host, sink, config.hotkey, modifiers)?.is_none() {
        return Ok(CommitOutcome::Inactive);
    }
    tool.mouse_moved(sink, 0.0);
    tool.mouse_moved(sink, 2.0 * f64::from(offset));
    tool.key_up(host, sink, config.hotkey)
}
