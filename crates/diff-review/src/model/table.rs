//! The diff table: an ordered list of row groups.

use super::chunk::{Row, RowGroup};
use super::comment::DiffSide;
use std::ops::Range;

/// An ordered sequence of row groups making up one file's diff table.
///
/// Rows are addressed by a table-wide index counting only content rows, in
/// table order. Placeholders contribute no rows.
#[derive(Debug, Clone, Default)]
pub struct DiffTable {
    groups: Vec<RowGroup>,

    // === Cached state, rebuilt on structural change ===
    /// Flattened (group_idx, row_idx) for every table-wide row index.
    row_positions: Vec<(usize, usize)>,
    /// Chunk indices of groups currently showing a collapse control.
    collapse_buttons: Vec<usize>,
}

impl DiffTable {
    /// Create a table from row groups in display order.
    pub fn new(groups: Vec<RowGroup>) -> Self {
        let mut table = Self {
            groups,
            row_positions: Vec::new(),
            collapse_buttons: Vec::new(),
        };
        table.reindex();
        table.refresh_collapse_buttons();
        table
    }

    pub fn groups(&self) -> &[RowGroup] {
        &self.groups
    }

    pub fn group(&self, position: usize) -> Option<&RowGroup> {
        self.groups.get(position)
    }

    pub fn group_mut(&mut self, position: usize) -> Option<&mut RowGroup> {
        self.groups.get_mut(position)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of content rows.
    pub fn row_count(&self) -> usize {
        self.row_positions.len()
    }

    /// Get a row by table-wide index.
    pub fn row(&self, row_index: usize) -> Option<&Row> {
        let &(group, row) = self.row_positions.get(row_index)?;
        self.groups.get(group)?.rows.get(row)
    }

    fn row_mut(&mut self, row_index: usize) -> Option<&mut Row> {
        let &(group, row) = self.row_positions.get(row_index)?;
        self.groups.get_mut(group)?.rows.get_mut(row)
    }

    /// Position of the group containing a row.
    pub fn group_of_row(&self, row_index: usize) -> Option<usize> {
        self.row_positions.get(row_index).map(|&(group, _)| group)
    }

    /// Virtual line number of a row.
    pub fn line_of(&self, row_index: usize) -> Option<u32> {
        self.row(row_index).map(|r| r.line)
    }

    /// Set the selection flag of a row. Returns false for unknown rows.
    pub fn set_selected(&mut self, row_index: usize, selected: bool) -> bool {
        match self.row_mut(row_index) {
            Some(row) => {
                row.selected = selected;
                true
            }
            None => false,
        }
    }

    /// Table-wide indices of all selected rows, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        (0..self.row_count())
            .filter(|&i| self.row(i).is_some_and(|r| r.selected))
            .collect()
    }

    /// Unmark every selected row.
    pub fn clear_selected(&mut self) {
        for row in self.groups.iter_mut().flat_map(|g| g.rows.iter_mut()) {
            row.selected = false;
        }
    }

    /// Set or clear a committed comment marker. Returns false for unknown rows.
    pub fn set_comment_flag(&mut self, row_index: usize, side: DiffSide, value: bool) -> bool {
        match self.row_mut(row_index) {
            Some(row) => {
                row.comment_flags.set(side, value);
                true
            }
            None => false,
        }
    }

    /// Position of the collapsed placeholder for a chunk.
    pub fn find_placeholder(&self, chunk_index: usize) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.chunk_index == chunk_index && g.is_placeholder())
    }

    /// Position of the expanded group that owns a chunk's collapse control.
    pub fn find_collapsible(&self, chunk_index: usize) -> Option<usize> {
        self.groups
            .iter()
            .position(|g| g.chunk_index == chunk_index && g.has_collapse_affordance)
    }

    /// Replace the group at `position` with `groups`.
    ///
    /// Returns the positions now occupied by the inserted groups.
    pub fn splice(&mut self, position: usize, groups: Vec<RowGroup>) -> Range<usize> {
        let count = groups.len();
        self.groups.splice(position..=position, groups);
        self.reindex();
        position..position + count
    }

    /// Remove the group at `position`.
    pub fn remove_group(&mut self, position: usize) -> Option<RowGroup> {
        if position >= self.groups.len() {
            return None;
        }
        let group = self.groups.remove(position);
        self.reindex();
        Some(group)
    }

    /// Chunk indices of the collapse controls present at the last refresh.
    pub fn collapse_buttons(&self) -> &[usize] {
        &self.collapse_buttons
    }

    /// Recompute the cached collapse controls.
    pub fn refresh_collapse_buttons(&mut self) -> &[usize] {
        self.collapse_buttons = self
            .groups
            .iter()
            .filter(|g| g.has_collapse_affordance)
            .map(|g| g.chunk_index)
            .collect();
        &self.collapse_buttons
    }

    fn reindex(&mut self) {
        self.row_positions = self
            .groups
            .iter()
            .enumerate()
            .flat_map(|(group_idx, group)| (0..group.rows.len()).map(move |row| (group_idx, row)))
            .collect();
    }
}
