//! # diff-review
//!
//! A headless review-UI core for code review pages: diff tables that can be
//! drag-selected to start comments, collapsed regions that expand and collapse
//! incrementally, and comment regions on file attachments (audio, text, XML).
//!
//! ## Design Principles
//!
//! This crate is designed to be **instrumented**: it owns the review state,
//! receives pointer and click actions, and emits events without calling
//! external services itself. Rendering, networking and comment dialogs belong
//! to the embedding application.
//!
//! - The diff table is an explicit list of row groups ("chunks"), not markup
//!   that has to be re-queried for state.
//! - Fragment fetches are split into a request half and an apply half, so
//!   several fetches may be in flight and land in any order.
//! - Collaborators sit behind small traits ([`FragmentFetcher`],
//!   [`WaveformPlayer`]).
//!
//! ## Usage
//!
//! ```rust,ignore
//! use diff_review::{CellKind, CellTarget, DiffAction, DiffEvent, DiffReviewableState, DiffSide};
//!
//! let mut state = DiffReviewableState::new(context, table);
//!
//! let cell = CellTarget::new(4, DiffSide::Left, CellKind::LineNumber);
//! state.handle_action(DiffAction::PointerDown(cell));
//! for event in state.handle_action(DiffAction::PointerUp(cell)) {
//!     if let DiffEvent::OpenCommentEditor { range, .. } = event {
//!         // open the comment dialog for range.begin_line..=range.end_line
//!     }
//! }
//!
//! // Expansion: dispatch, fetch, apply.
//! for event in state.handle_action(DiffAction::Collapse { chunk_index: 1 }) {
//!     if let DiffEvent::RequestFragment(request) = event {
//!         let events = state.run_fragment_request(&fetcher, request).await?;
//!     }
//! }
//! ```

pub mod action;
pub mod attachment;
pub mod event;
pub mod model;
pub mod parser;
pub mod state;
pub mod traits;

// Re-export commonly used types
pub use action::DiffAction;
pub use event::{AttachmentEvent, DiffEvent};
pub use model::{
    CellKind, CellTarget, ChunkKind, CommentRange, ContextSpec, DiffSide, DiffTable,
    ExpansionState, FileDiffContext, Fragment, FragmentRequest, LinesOfContext, Row, RowGroup,
};
pub use parser::{parse_unified_diff, FileTable, ParseError};
pub use state::{
    ChunkExpansionController, CommentRowSelector, DiffReviewableState, ExpansionError,
    SelectionOutcome,
};
pub use traits::{FetchError, FragmentFetcher, RegionId, WaveformPlayer};
