//! Comment anchoring: pointer targets, file context and selected ranges.

use serde::{Deserialize, Serialize};

/// Which side of the diff a line-number column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// Old file (left line-number column).
    Left,
    /// New file (right line-number column).
    #[default]
    Right,
}

impl DiffSide {
    /// Short name used in logs and serialized comment fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiffSide::Left => "left",
            DiffSide::Right => "right",
        }
    }
}

/// The element of a row that a pointer event targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// A line-number cell (where selections start).
    LineNumber,
    /// A line contents cell.
    Contents,
    /// A committed comment flag inside a line-number cell.
    CommentFlag,
    /// The hover-only ghost comment flag.
    GhostFlag,
}

/// A pointer target inside the diff table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTarget {
    /// Table-wide row index (across all row groups).
    pub row_index: usize,
    /// File side of the column the cell belongs to.
    pub side: DiffSide,
    /// What kind of element was targeted.
    pub kind: CellKind,
}

impl CellTarget {
    pub fn new(row_index: usize, side: DiffSide, kind: CellKind) -> Self {
        Self {
            row_index,
            side,
            kind,
        }
    }

    /// Whether this target lives in a line-number column.
    ///
    /// Comment flags and the ghost flag are rendered inside line-number
    /// cells, so moving onto them does not leave the column.
    pub fn is_in_line_number_column(&self) -> bool {
        matches!(
            self.kind,
            CellKind::LineNumber | CellKind::CommentFlag | CellKind::GhostFlag
        )
    }
}

/// Identifies the file diff a table belongs to.
///
/// Supplied by the page when constructing the reviewable state and copied
/// into every comment request, so nothing has to be looked up from ambient
/// global tables.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileDiffContext {
    /// Index of the file on the diff page.
    pub file_index: usize,
    /// Server-side file diff ID.
    pub filediff_id: u64,
    /// Diff revision.
    pub revision: u32,
    /// File diff ID of the interdiff side, when viewing an interdiff.
    #[serde(default)]
    pub interfilediff_id: Option<u64>,
    /// Interdiff revision, when viewing an interdiff.
    #[serde(default)]
    pub interdiff_revision: Option<u32>,
}

impl FileDiffContext {
    pub fn new(file_index: usize, filediff_id: u64, revision: u32) -> Self {
        Self {
            file_index,
            filediff_id,
            revision,
            interfilediff_id: None,
            interdiff_revision: None,
        }
    }

    /// Attach an interdiff side.
    pub fn with_interdiff(mut self, interfilediff_id: u64, interdiff_revision: u32) -> Self {
        self.interfilediff_id = Some(interfilediff_id);
        self.interdiff_revision = Some(interdiff_revision);
        self
    }
}

/// A finished row selection, ready to become a comment region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRange {
    /// First selected row (table-wide index).
    pub begin_row: usize,
    /// Last selected row (table-wide index).
    pub end_row: usize,
    /// Lowest selected line number.
    pub begin_line: u32,
    /// Highest selected line number.
    pub end_line: u32,
    /// Side of the line-number column the selection was made in.
    pub side: DiffSide,
}

impl CommentRange {
    /// Number of lines covered by the range.
    pub fn num_lines(&self) -> u32 {
        self.end_line - self.begin_line + 1
    }

    /// Check if this range spans more than one line.
    pub fn is_multiline(&self) -> bool {
        self.begin_line != self.end_line
    }
}
