//! The overlap pipeline: analyze, split, optionally cross.

pub mod analyze;
pub mod cross;
pub mod split;

use tracing::{debug, warn};

use crate::config::OverlapConfig;
use crate::error::OverlapError;
use crate::outline::Outline;

pub use analyze::{analyze, analyze_contours, Analysis, Corner, CurveSplit, SideGeometry};
pub use cross::{cross_overlap, pair_corners, CrossReport};
pub use split::{split_corners, CornerSite, Junction};

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlapped {
    pub outline: Outline,
    /// Corners that were split.
    pub corners: usize,
    /// Corner pairs joined crosswise.
    pub crossed: usize,
    /// Corners and pairs that were skipped, one error each.
    pub rejected: Vec<OverlapError>,
}

impl Overlapped {
    pub fn cross_succeeded(&self) -> bool {
        self.crossed > 0
    }
}

/// Offset every selected corner of `outline` by `offset` font units.
///
/// Positive offsets extend both sides past the corner (overlap), negative
/// ones cut it off (chamfer). With `cross` set and a nonzero offset,
/// corners are then paired and joined crosswise.
pub fn overlap(outline: &Outline, offset: f64, cross: bool, config: &OverlapConfig) -> Overlapped {
    let analysis = analyze(outline, offset, config.arclen_accuracy);
    for err in &analysis.rejected {
        warn!(%err, "corner skipped");
    }
    let (mut split, junctions) = split_corners(outline, &analysis);
    let mut rejected = analysis.rejected;

    let mut crossed = 0;
    if cross && offset != 0.0 {
        let report = cross_overlap(&mut split, &junctions, config.continuity_tolerance);
        crossed = report.merged;
        rejected.extend(report.skipped);
    }
    debug!(offset, corners = junctions.len(), crossed, "overlap built");

    Overlapped {
        outline: split,
        corners: junctions.len(),
        crossed,
        rejected,
    }
}
