//! Data models for the review table.

mod chunk;
mod comment;
mod fragment;
mod table;

pub use chunk::{ChunkKind, CommentFlags, ExpandAffordance, ExpansionState, Row, RowGroup};
pub use comment::{CellKind, CellTarget, CommentRange, DiffSide, FileDiffContext};
pub use fragment::{ContextSpec, Fragment, FragmentRequest, LinesOfContext, LinesOfContextError};
pub use table::DiffTable;
