//! Field-wise merge of partial updates into button records
//!
//! Drag syncs only carry geometry and modal saves only carry text, so neither
//! may blank out the other's fields. Merging starts from the existing record
//! (or an all-defaults record for unknown ids) and overwrites only what the
//! patch supplies.

use crate::types::{Button, ButtonPatch};

/// Merge `patch` over `existing`, returning the resulting record
pub fn merge(existing: Option<&Button>, patch: &ButtonPatch) -> Button {
    let base = existing.cloned().unwrap_or_default();
    Button {
        x: patch.x.unwrap_or(base.x),
        y: patch.y.unwrap_or(base.y),
        width: patch.width.unwrap_or(base.width),
        height: patch.height.unwrap_or(base.height),
        text: patch.text.clone().unwrap_or(base.text),
        additional_text: patch.additional_text.clone().unwrap_or(base.additional_text),
    }
}
