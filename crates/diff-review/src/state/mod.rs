//! State management for reviewable diff tables.

mod chunk_expansion;
mod reviewable_state;
mod row_selector;

pub use chunk_expansion::{ChunkExpansionController, ExpansionError};
pub use reviewable_state::DiffReviewableState;
pub use row_selector::{CommentRowSelector, SelectionOutcome};
