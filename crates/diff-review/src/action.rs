//! Diff Table Actions
//!
//! Tagged actions that the diff reviewable state can process. The embedding
//! application translates pointer events and control clicks into these and
//! dispatches them to [`DiffReviewableState`](crate::DiffReviewableState).

use crate::model::{CellTarget, ContextSpec};
use serde::{Deserialize, Serialize};

/// Actions that can be performed on a diff table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffAction {
    // === Row selection ===
    /// Pointer moved onto a cell
    PointerEnter(CellTarget),
    /// Pointer moved off a cell, optionally onto `related`
    PointerLeave {
        target: CellTarget,
        #[serde(default)]
        related: Option<CellTarget>,
    },
    /// Button pressed over a cell
    PointerDown(CellTarget),
    /// Button released over a cell
    PointerUp(CellTarget),

    // === Chunk expansion ===
    /// Expand a collapsed chunk
    Expand { chunk_index: usize, context: ContextSpec },
    /// Collapse an expanded chunk back to its placeholder
    Collapse { chunk_index: usize },
}

impl DiffAction {
    /// Check if this action belongs to row selection
    pub fn is_pointer_action(&self) -> bool {
        matches!(
            self,
            DiffAction::PointerEnter(_)
                | DiffAction::PointerLeave { .. }
                | DiffAction::PointerDown(_)
                | DiffAction::PointerUp(_)
        )
    }

    /// Check if this action changes chunk expansion
    pub fn is_expansion_action(&self) -> bool {
        matches!(self, DiffAction::Expand { .. } | DiffAction::Collapse { .. })
    }
}
