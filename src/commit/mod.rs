//! Committing a preview back into the glyph.
//!
//! The preview holds only the contours that had a selection, in document
//! order. Cross-overlap may have merged or split some of them, so the
//! preview can hold more or fewer contours than were selected. The excess
//! (or deficit) is absorbed by the first selected slots: with an excess of
//! `e`, the first selected slot takes `1 + e` preview contours; with a
//! deficit of `e`, the first `e` selected slots are emptied.

pub mod snap;

use norad::Component;
use tracing::debug;

use crate::error::OverlapError;
use crate::outline::{Contour, Outline};

/// What becomes of one document contour.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    Keep,
    /// Replace the contour with these, possibly none.
    Replace(Vec<Contour>),
}

/// Everything a host needs to apply a gesture as one undoable edit.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitPlan {
    /// One entry per document contour, in document order.
    pub slots: Vec<Slot>,
    /// Components to restore after the contours are replaced.
    pub components: Vec<Component>,
    /// Undo label.
    pub label: String,
}

impl CommitPlan {
    /// Contour count after the plan is applied.
    pub fn contour_count(&self) -> usize {
        self.slots
            .iter()
            .map(|s| match s {
                Slot::Keep => 1,
                Slot::Replace(list) => list.len(),
            })
            .sum()
    }

    pub fn replacements(&self) -> impl Iterator<Item = &Contour> {
        self.slots.iter().flat_map(|s| match s {
            Slot::Keep => &[][..],
            Slot::Replace(list) => list.as_slice(),
        })
    }
}

/// Distribute `preview` contours over the `selected` slots of a document
/// with `document_len` contours.
pub fn reconcile(
    document_len: usize,
    selected: &[usize],
    preview: Vec<Contour>,
) -> Result<Vec<Slot>, OverlapError> {
    let expected = preview.len();
    let mut excess = expected as isize - selected.len() as isize;
    let mut preview = preview.into_iter();
    let mut consumed = 0;

    let mut slots = Vec::with_capacity(document_len);
    for i in 0..document_len {
        if !selected.contains(&i) {
            slots.push(Slot::Keep);
            continue;
        }
        if excess >= 0 {
            let take = 1 + excess as usize;
            excess = 0;
            let group: Vec<Contour> = preview.by_ref().take(take).collect();
            consumed += group.len();
            slots.push(Slot::Replace(group));
        } else {
            excess += 1;
            slots.push(Slot::Replace(Vec::new()));
        }
    }

    if consumed != expected {
        return Err(OverlapError::Reconcile {
            expected,
            found: consumed,
        });
    }
    Ok(slots)
}

/// Build the plan that writes `preview` over `document`.
///
/// Preview coordinates are snapped to `grid` (0 disables snapping) and
/// every replacement contour is validated before the plan is returned.
pub fn build_plan(
    document: &Outline,
    selected: &[usize],
    preview: &Outline,
    components: Vec<Component>,
    grid: f64,
    label: impl Into<String>,
) -> Result<CommitPlan, OverlapError> {
    let mut contours = preview.contours.clone();
    for contour in &mut contours {
        snap::to_grid(contour, grid);
        contour.validate()?;
    }
    let slots = reconcile(document.contours.len(), selected, contours)?;
    let plan = CommitPlan {
        slots,
        components,
        label: label.into(),
    };
    debug!(
        before = document.contours.len(),
        after = plan.contour_count(),
        "commit planned"
    );
    Ok(plan)
}
