//! Drag selection of diff rows for new comment regions.

use crate::model::{CellKind, CellTarget, CommentRange, DiffSide, DiffTable};
use log::debug;

/// What a pointer release resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Open an editor for a new comment over this range.
    Create(CommentRange),
    /// The release landed on an existing comment; let it open itself.
    OpenExisting {
        row_index: usize,
        side: DiffSide,
        line: u32,
    },
}

/// Tracks a pointer drag across the line-number columns of a diff table.
///
/// While a drag is active the rows flagged selected in the table are
/// exactly the rows between the anchor (the pressed row) and the most
/// recently hovered row, inclusive. Without a drag at most one row is
/// flagged: the hover row under the pointer.
#[derive(Debug, Clone, Default)]
pub struct CommentRowSelector {
    begin: Option<usize>,
    end: Option<usize>,
    begin_line: u32,
    end_line: u32,
    last_seen_index: usize,
    anchor: Option<usize>,
    side: DiffSide,
    hover_row: Option<usize>,
    ghost_flag: Option<(usize, DiffSide)>,
}

impl CommentRowSelector {
    pub fn new() -> Self {
        Self::default()
    }

    // === Accessors ===

    /// First selected row, if a drag is active.
    pub fn begin(&self) -> Option<usize> {
        self.begin
    }

    /// Last selected row, if a drag is active.
    pub fn end(&self) -> Option<usize> {
        self.end
    }

    /// Lowest selected line number (0 when idle).
    pub fn begin_line(&self) -> u32 {
        self.begin_line
    }

    /// Highest selected line number (0 when idle).
    pub fn end_line(&self) -> u32 {
        self.end_line
    }

    pub fn last_seen_index(&self) -> usize {
        self.last_seen_index
    }

    pub fn is_selecting(&self) -> bool {
        self.anchor.is_some()
    }

    /// Row and side the ghost comment flag is shown at.
    pub fn ghost_flag(&self) -> Option<(usize, DiffSide)> {
        self.ghost_flag
    }

    pub fn hover_row(&self) -> Option<usize> {
        self.hover_row
    }

    // === Pointer events ===

    /// Pointer moved onto a cell.
    pub fn pointer_enter(&mut self, table: &mut DiffTable, target: CellTarget) {
        if self.is_selecting() {
            if target.is_in_line_number_column() {
                self.extend_to(table, target.row_index);
            }
            return;
        }

        match target.kind {
            CellKind::LineNumber | CellKind::CommentFlag => {
                let Some(row) = table.row(target.row_index) else {
                    return;
                };
                let has_comment = row.has_comment(target.side);

                self.unmark_hover_row(table);
                table.set_selected(target.row_index, true);
                self.hover_row = Some(target.row_index);

                self.ghost_flag = if has_comment {
                    None
                } else {
                    Some((target.row_index, target.side))
                };
            }
            CellKind::Contents => {
                self.ghost_flag = None;
                self.unmark_hover_row(table);
            }
            CellKind::GhostFlag => {}
        }
    }

    /// Pointer moved off a cell. `related` is where it went, if anywhere.
    pub fn pointer_leave(
        &mut self,
        table: &mut DiffTable,
        _target: CellTarget,
        related: Option<CellTarget>,
    ) {
        if self.is_selecting() {
            return;
        }
        if related.is_some_and(|r| r.is_in_line_number_column()) {
            return;
        }

        self.ghost_flag = None;
        self.unmark_hover_row(table);
    }

    /// Button pressed over a cell: start a selection anchored at its row.
    pub fn pointer_down(&mut self, table: &mut DiffTable, target: CellTarget) {
        if !matches!(target.kind, CellKind::LineNumber | CellKind::CommentFlag) {
            return;
        }
        let Some(line) = table.line_of(target.row_index) else {
            return;
        };

        self.unmark_hover_row(table);
        self.ghost_flag = None;

        let row = target.row_index;
        self.anchor = Some(row);
        self.begin = Some(row);
        self.end = Some(row);
        self.begin_line = line;
        self.end_line = line;
        self.last_seen_index = row;
        self.side = target.side;
        table.set_selected(row, true);

        debug!(
            "Selection started at row {} (line {}, {})",
            row,
            line,
            target.side.as_str()
        );
    }

    /// Button released over a cell.
    ///
    /// Always leaves the selector idle with no rows flagged.
    pub fn pointer_up(
        &mut self,
        table: &mut DiffTable,
        target: CellTarget,
    ) -> Option<SelectionOutcome> {
        let outcome = if self.is_existing_comment(table, target) {
            table
                .line_of(target.row_index)
                .map(|line| SelectionOutcome::OpenExisting {
                    row_index: target.row_index,
                    side: target.side,
                    line,
                })
        } else {
            self.current_range().map(SelectionOutcome::Create)
        };

        debug!("Selection released: {:?}", outcome);
        self.reset(table);
        outcome
    }

    /// The active selection as a comment range.
    pub fn current_range(&self) -> Option<CommentRange> {
        match (self.begin, self.end) {
            (Some(begin_row), Some(end_row)) => Some(CommentRange {
                begin_row,
                end_row,
                begin_line: self.begin_line,
                end_line: self.end_line,
                side: self.side,
            }),
            _ => None,
        }
    }

    /// Drop any selection and hover state and unflag every row.
    pub fn reset(&mut self, table: &mut DiffTable) {
        table.clear_selected();
        *self = Self::default();
    }

    fn extend_to(&mut self, table: &mut DiffTable, row: usize) {
        let Some(anchor) = self.anchor else {
            return;
        };
        let (Some(anchor_line), Some(line)) = (table.line_of(anchor), table.line_of(row)) else {
            return;
        };

        let (lo, hi) = (anchor.min(row), anchor.max(row));

        // Old and new ranges share the anchor, so they differ only between
        // the last hovered row and this one.
        let from = self.last_seen_index.min(row);
        let to = self.last_seen_index.max(row);
        for i in from..=to {
            table.set_selected(i, lo <= i && i <= hi);
        }

        self.begin = Some(lo);
        self.end = Some(hi);
        self.begin_line = anchor_line.min(line);
        self.end_line = anchor_line.max(line);
        self.last_seen_index = row;
    }

    fn is_existing_comment(&self, table: &DiffTable, target: CellTarget) -> bool {
        match target.kind {
            CellKind::CommentFlag => true,
            CellKind::LineNumber => table
                .row(target.row_index)
                .is_some_and(|row| row.has_comment(target.side)),
            _ => false,
        }
    }

    fn unmark_hover_row(&mut self, table: &mut DiffTable) {
        if let Some(row) = self.hover_row.take() {
            table.set_selected(row, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChunkKind, Row, RowGroup};
    use pretty_assertions::assert_eq;

    /// `[equal 1-5][delete 6-15]`: row index N holds line N + 1.
    fn table() -> DiffTable {
        DiffTable::new(vec![
            RowGroup::equal_run(0, 1, 5),
            RowGroup::new(1, ChunkKind::Delete, (6..16).map(Row::new).collect()),
        ])
    }

    fn line_cell(row: usize) -> CellTarget {
        CellTarget::new(row, DiffSide::Left, CellKind::LineNumber)
    }

    fn assert_idle(selector: &CommentRowSelector, table: &DiffTable) {
        assert_eq!(selector.begin(), None);
        assert_eq!(selector.end(), None);
        assert_eq!(selector.begin_line(), 0);
        assert_eq!(selector.end_line(), 0);
        assert_eq!(selector.last_seen_index(), 0);
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn test_pointer_down_starts_selection() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(4));

        assert!(selector.is_selecting());
        assert_eq!(selector.begin(), Some(4));
        assert_eq!(selector.end(), Some(4));
        assert_eq!(selector.begin_line(), 5);
        assert_eq!(selector.end_line(), 5);
        assert_eq!(selector.last_seen_index(), 4);
        assert_eq!(table.selected_rows(), vec![4]);
    }

    #[test]
    fn test_pointer_down_on_contents_is_ignored() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(
            &mut table,
            CellTarget::new(4, DiffSide::Left, CellKind::Contents),
        );

        assert!(!selector.is_selecting());
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn test_drag_across_chunk_boundary() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(4));
        selector.pointer_enter(&mut table, line_cell(5));
        selector.pointer_enter(&mut table, line_cell(6));
        selector.pointer_enter(&mut table, line_cell(7));
        assert_eq!(table.selected_rows(), vec![4, 5, 6, 7]);

        let outcome = selector.pointer_up(&mut table, line_cell(7));
        assert_eq!(
            outcome,
            Some(SelectionOutcome::Create(CommentRange {
                begin_row: 4,
                end_row: 7,
                begin_line: 5,
                end_line: 8,
                side: DiffSide::Left,
            }))
        );
        assert_idle(&selector, &table);
    }

    #[test]
    fn test_drag_upward_with_skipped_rows() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(7));

        selector.pointer_enter(&mut table, line_cell(5));
        assert_eq!(table.selected_rows(), vec![5, 6, 7]);

        selector.pointer_enter(&mut table, line_cell(1));
        assert_eq!(table.selected_rows(), vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(selector.begin_line(), 2);
        assert_eq!(selector.end_line(), 8);

        let outcome = selector.pointer_up(&mut table, line_cell(1));
        let Some(SelectionOutcome::Create(range)) = outcome else {
            panic!("expected a new comment range, got {:?}", outcome);
        };
        assert_eq!((range.begin_line, range.end_line), (2, 8));
        assert_eq!((range.begin_row, range.end_row), (1, 7));
    }

    #[test]
    fn test_drag_crossing_the_anchor_shrinks_then_grows() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(5));
        selector.pointer_enter(&mut table, line_cell(9));
        assert_eq!(table.selected_rows(), vec![5, 6, 7, 8, 9]);

        selector.pointer_enter(&mut table, line_cell(2));
        assert_eq!(table.selected_rows(), vec![2, 3, 4, 5]);
        assert_eq!(selector.begin_line(), 3);
        assert_eq!(selector.end_line(), 6);

        selector.pointer_enter(&mut table, line_cell(5));
        assert_eq!(table.selected_rows(), vec![5]);
        assert_eq!(selector.begin_line(), 6);
        assert_eq!(selector.end_line(), 6);
    }

    #[test]
    fn test_contents_cell_does_not_extend() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(2));
        selector.pointer_enter(
            &mut table,
            CellTarget::new(6, DiffSide::Left, CellKind::Contents),
        );

        assert_eq!(table.selected_rows(), vec![2]);
        assert_eq!(selector.end_line(), 3);
    }

    #[test]
    fn test_release_on_comment_flag_opens_existing() {
        let mut table = table();
        table.set_comment_flag(4, DiffSide::Left, true);
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(2));
        selector.pointer_enter(&mut table, line_cell(4));
        let outcome = selector.pointer_up(
            &mut table,
            CellTarget::new(4, DiffSide::Left, CellKind::CommentFlag),
        );

        assert_eq!(
            outcome,
            Some(SelectionOutcome::OpenExisting {
                row_index: 4,
                side: DiffSide::Left,
                line: 5,
            })
        );
        assert_idle(&selector, &table);
    }

    #[test]
    fn test_release_on_commented_row_creates_nothing() {
        let mut table = table();
        table.set_comment_flag(3, DiffSide::Right, true);
        let mut selector = CommentRowSelector::new();

        let cell = CellTarget::new(3, DiffSide::Right, CellKind::LineNumber);
        selector.pointer_down(&mut table, cell);
        let outcome = selector.pointer_up(&mut table, cell);

        assert!(matches!(
            outcome,
            Some(SelectionOutcome::OpenExisting { row_index: 3, .. })
        ));
        assert_idle(&selector, &table);
    }

    #[test]
    fn test_release_without_selection() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        assert_eq!(selector.pointer_up(&mut table, line_cell(3)), None);
        assert_idle(&selector, &table);
    }

    #[test]
    fn test_hover_shows_ghost_flag() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(4));
        assert_eq!(selector.ghost_flag(), Some((4, DiffSide::Left)));
        assert_eq!(table.selected_rows(), vec![4]);

        selector.pointer_enter(&mut table, line_cell(6));
        assert_eq!(selector.ghost_flag(), Some((6, DiffSide::Left)));
        assert_eq!(table.selected_rows(), vec![6]);
    }

    #[test]
    fn test_hover_commented_row_suppresses_ghost_flag() {
        let mut table = table();
        table.set_comment_flag(4, DiffSide::Left, true);
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(4));
        assert_eq!(selector.ghost_flag(), None);
        assert_eq!(table.selected_rows(), vec![4]);

        // The other side has no comment.
        selector.pointer_enter(
            &mut table,
            CellTarget::new(4, DiffSide::Right, CellKind::LineNumber),
        );
        assert_eq!(selector.ghost_flag(), Some((4, DiffSide::Right)));
    }

    #[test]
    fn test_hover_contents_hides_ghost_flag() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(4));
        selector.pointer_enter(
            &mut table,
            CellTarget::new(4, DiffSide::Left, CellKind::Contents),
        );

        assert_eq!(selector.ghost_flag(), None);
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn test_leaving_line_number_column_clears_hover() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(4));
        selector.pointer_leave(&mut table, line_cell(4), None);

        assert_eq!(selector.ghost_flag(), None);
        assert_eq!(selector.hover_row(), None);
        assert!(table.selected_rows().is_empty());
    }

    #[test]
    fn test_moving_onto_ghost_flag_keeps_hover() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(4));
        selector.pointer_leave(
            &mut table,
            line_cell(4),
            Some(CellTarget::new(4, DiffSide::Left, CellKind::GhostFlag)),
        );

        assert_eq!(selector.ghost_flag(), Some((4, DiffSide::Left)));
        assert_eq!(table.selected_rows(), vec![4]);
    }

    #[test]
    fn test_leave_during_drag_keeps_selection() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_down(&mut table, line_cell(1));
        selector.pointer_enter(&mut table, line_cell(3));
        selector.pointer_leave(&mut table, line_cell(3), None);

        assert!(selector.is_selecting());
        assert_eq!(table.selected_rows(), vec![1, 2, 3]);
    }

    #[test]
    fn test_pointer_down_replaces_hover_row() {
        let mut table = table();
        let mut selector = CommentRowSelector::new();

        selector.pointer_enter(&mut table, line_cell(8));
        selector.pointer_down(&mut table, line_cell(2));

        assert_eq!(selector.ghost_flag(), None);
        assert_eq!(table.selected_rows(), vec![2]);
    }
}
