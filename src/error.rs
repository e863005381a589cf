use kurbo::Point;
use thiserror::Error;

/// Errors raised while analysing, editing or committing an outline.
///
/// Corner-scoped variants (`DegenerateSegment`, `OpenEndpoint`,
/// `UnresolvedPair`) are collected and reported without stopping the
/// rest of the gesture; the others abort the operation that raised them.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum OverlapError {
    #[error("zero-length segment adjoining corner at ({}, {})", .at.x, .at.y)]
    DegenerateSegment { at: Point },

    #[error("corner at ({}, {}) sits on an open contour end", .at.x, .at.y)]
    OpenEndpoint { at: Point },

    #[error("cannot cross-overlap ({}, {}) with ({}, {}): {reason}", .a.x, .a.y, .b.x, .b.y)]
    UnresolvedPair { a: Point, b: Point, reason: String },

    #[error("empty contour")]
    EmptyContour,

    #[error("invalid contour: {0}")]
    InvalidContour(String),

    #[error("unsupported outline data: {0}")]
    Unsupported(String),

    #[error("commit reconciliation expected {expected} preview contours, consumed {found}")]
    Reconcile { expected: usize, found: usize },

    #[error("commit failed: {0}")]
    Commit(String),
}
