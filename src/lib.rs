//! overlapper: drag-to-overlap and chamfer for glyph outline corners.
//!
//! Selected on-curve corners are pulled apart along their two adjoining
//! segments. A positive offset extends both sides past the corner and
//! bridges them, leaving the small self-overlapping loop that keeps
//! corners crisp when outlines are later unioned. A negative offset cuts
//! the corner off instead. In cross mode, pairs of nearby corners are
//! rejoined crosswise so that abutting shapes merge into one contour.
//!
//! # Example
//!
//! ```
//! use overlapper::{overlap, Outline, OverlapConfig};
//! use kurbo::{BezPath, Point};
//!
//! let mut square = BezPath::new();
//! square.move_to((0.0, 0.0));
//! square.line_to((0.0, 100.0));
//! square.line_to((100.0, 100.0));
//! square.line_to((100.0, 0.0));
//! square.close_path();
//!
//! let mut outline = Outline::from_bezpaths(&[square])?;
//! outline.select_at(Point::ZERO);
//! let result = overlap(&outline, -10.0, false, &OverlapConfig::default());
//! assert_eq!(result.outline.on_curve_count(), 5);
//! # Ok::<(), overlapper::OverlapError>(())
//! ```

#![forbid(unsafe_code)]

mod config;
mod geom;

pub mod commit;
pub mod error;
pub mod outline;
pub mod overlap;
pub mod session;
pub mod ufo;

// Re-export kurbo so callers build paths with the same version.
pub use kurbo;

pub use commit::{CommitPlan, Slot};
pub use config::{OverlapConfig, Rgba};
pub use error::OverlapError;
pub use outline::{Contour, Outline, OutlinePoint, PointId, PointKind, Segment};
pub use overlap::{overlap, Overlapped};
pub use session::{
    CommitOutcome, GlyphHost, Mode, Modifiers, Overlapper, Phase, PreviewSink, Status,
};
