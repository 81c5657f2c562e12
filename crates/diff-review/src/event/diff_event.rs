//! Events emitted by the diff reviewable state for the parent application to handle.

use crate::model::{CommentRange, DiffSide, FileDiffContext, FragmentRequest};
use serde::Serialize;

/// Events emitted by the diff reviewable state.
///
/// The state is instrumented: instead of opening dialogs or performing
/// fetches itself, it emits events and the parent application acts on them.
///
/// # Example
///
/// ```ignore
/// for event in state.handle_action(action) {
///     match event {
///         DiffEvent::OpenCommentEditor { context, range } => {
///             comment_dialog.open(&context, range.begin_line, range.end_line);
///         }
///         DiffEvent::RequestFragment(request) => {
///             let result = fetcher.fetch_fragment(&state.context, &request).await;
///             state.apply_fragment(request, result)?;
///         }
///         DiffEvent::ChunkExpansionChanged => sticky_headers.update(),
///         DiffEvent::OpenExistingComment { .. } => {}
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiffEvent {
    /// A selection was released: open an editor for a new comment region.
    OpenCommentEditor {
        /// File the selection was made in.
        context: FileDiffContext,
        /// Selected rows and lines.
        range: CommentRange,
    },

    /// The release landed on an existing comment: open that comment instead.
    OpenExistingComment {
        /// Row carrying the comment flag.
        row_index: usize,
        /// Column the flag lives in.
        side: DiffSide,
        /// Line number of that row.
        line: u32,
    },

    /// An expand or collapse control was activated; fetch this fragment.
    RequestFragment(FragmentRequest),

    /// The table structure changed after an expand or collapse.
    ChunkExpansionChanged,
}
