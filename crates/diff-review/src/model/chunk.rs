//! Chunk data structures: rows and the row groups they belong to.

use super::comment::DiffSide;
use super::fragment::ContextSpec;
use serde::{Deserialize, Serialize};

/// Diff classification of a row group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Unchanged lines.
    Equal,
    /// Lines only present in the new file.
    Insert,
    /// Lines only present in the old file.
    Delete,
    /// Old lines replaced by new lines.
    Replace,
    /// Placeholder for hidden unchanged lines.
    Collapsed,
}

impl ChunkKind {
    /// Get the class name the group is rendered with.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Equal => "equal",
            ChunkKind::Insert => "insert",
            ChunkKind::Delete => "delete",
            ChunkKind::Replace => "replace",
            ChunkKind::Collapsed => "collapsed",
        }
    }
}

/// How much of a chunk's content is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionState {
    /// Only a placeholder is shown.
    Collapsed,
    /// Some context was revealed, the rest is still hidden.
    PartiallyExpanded,
    /// Every line is shown.
    #[default]
    FullyExpanded,
}

/// Committed comment markers on a row, per line-number column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommentFlags {
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
}

impl CommentFlags {
    pub fn has(&self, side: DiffSide) -> bool {
        match side {
            DiffSide::Left => self.left,
            DiffSide::Right => self.right,
        }
    }

    pub fn set(&mut self, side: DiffSide, value: bool) {
        match side {
            DiffSide::Left => self.left = value,
            DiffSide::Right => self.right = value,
        }
    }
}

/// A single table row: one line of one or both file sides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Virtual line number of the row within the diff.
    pub line: u32,
    /// Line number in the old file.
    #[serde(default)]
    pub old_line: Option<u32>,
    /// Line number in the new file.
    #[serde(default)]
    pub new_line: Option<u32>,
    /// Old file contents of the line.
    #[serde(default)]
    pub old_text: Option<String>,
    /// New file contents of the line.
    #[serde(default)]
    pub new_text: Option<String>,
    /// Committed comment markers.
    #[serde(default)]
    pub comment_flags: CommentFlags,
    /// Presentation-only selection flag.
    #[serde(skip)]
    pub selected: bool,
}

impl Row {
    /// Create a row with just a virtual line number.
    pub fn new(line: u32) -> Self {
        Self {
            line,
            old_line: None,
            new_line: None,
            old_text: None,
            new_text: None,
            comment_flags: CommentFlags::default(),
            selected: false,
        }
    }

    /// Create an unchanged row present on both sides.
    pub fn equal(line: u32, old_line: u32, new_line: u32, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            old_line: Some(old_line),
            new_line: Some(new_line),
            old_text: Some(text.clone()),
            new_text: Some(text),
            ..Self::new(line)
        }
    }

    /// Check if the row carries a comment marker on the given side.
    pub fn has_comment(&self, side: DiffSide) -> bool {
        self.comment_flags.has(side)
    }
}

/// An expand control offered by a collapsed placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandAffordance {
    /// How much to reveal when activated.
    pub context: ContextSpec,
}

/// A contiguous group of rows sharing one classification (a "tbody").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowGroup {
    /// Server-side index of the chunk this group renders.
    pub chunk_index: usize,
    /// Diff classification.
    pub kind: ChunkKind,
    /// Visibility of the chunk's lines.
    #[serde(default)]
    pub expansion: ExpansionState,
    /// Whether the group arrived through a fragment fetch.
    #[serde(default)]
    pub loaded: bool,
    /// Rows, empty for collapsed placeholders.
    #[serde(default)]
    pub rows: Vec<Row>,
    /// Number of lines hidden behind a placeholder.
    #[serde(default)]
    pub hidden_lines: u32,
    /// Function/class header the placeholder can expand to.
    #[serde(default)]
    pub header: Option<String>,
    /// Expand controls (placeholders only).
    #[serde(default)]
    pub expand_affordances: Vec<ExpandAffordance>,
    /// Whether the group shows a collapse control.
    #[serde(default)]
    pub has_collapse_affordance: bool,
}

impl RowGroup {
    /// Create a fully visible group with the given rows.
    pub fn new(chunk_index: usize, kind: ChunkKind, rows: Vec<Row>) -> Self {
        Self {
            chunk_index,
            kind,
            expansion: ExpansionState::FullyExpanded,
            loaded: false,
            rows,
            hidden_lines: 0,
            header: None,
            expand_affordances: Vec::new(),
            has_collapse_affordance: false,
        }
    }

    /// Create a collapsed placeholder hiding `hidden_lines` lines.
    pub fn collapsed(chunk_index: usize, hidden_lines: u32, affordances: Vec<ContextSpec>) -> Self {
        Self {
            expansion: ExpansionState::Collapsed,
            hidden_lines,
            expand_affordances: affordances
                .into_iter()
                .map(|context| ExpandAffordance { context })
                .collect(),
            ..Self::new(chunk_index, ChunkKind::Collapsed, Vec::new())
        }
    }

    /// Create a group as returned by an expansion fetch.
    pub fn loaded(chunk_index: usize, rows: Vec<Row>) -> Self {
        Self {
            loaded: true,
            has_collapse_affordance: true,
            ..Self::new(chunk_index, ChunkKind::Equal, rows)
        }
    }

    /// Create a run of unchanged rows with consecutive line numbers.
    pub fn equal_run(chunk_index: usize, start_line: u32, num_rows: u32) -> Self {
        let rows = (start_line..start_line + num_rows)
            .map(|line| Row::equal(line, line, line, ""))
            .collect();
        Self::new(chunk_index, ChunkKind::Equal, rows)
    }

    /// Set the function/class header of a placeholder.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Check if this group is a collapsed placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.kind == ChunkKind::Collapsed
    }

    /// Check if the group can be absorbed into a neighbouring expansion.
    pub fn is_mergeable(&self) -> bool {
        self.kind == ChunkKind::Equal && self.loaded
    }

    /// First virtual line number of the group.
    pub fn start_line(&self) -> Option<u32> {
        self.rows.first().map(|r| r.line)
    }

    /// Number of rows (hidden lines for placeholders).
    pub fn line_count(&self) -> u32 {
        if self.is_placeholder() {
            self.hidden_lines
        } else {
            self.rows.len() as u32
        }
    }
}
