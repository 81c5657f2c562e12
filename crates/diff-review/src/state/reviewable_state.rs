//! State for one reviewable file diff table.

use super::{ChunkExpansionController, CommentRowSelector, ExpansionError, SelectionOutcome};
use crate::action::DiffAction;
use crate::event::DiffEvent;
use crate::model::{DiffSide, DiffTable, FileDiffContext, Fragment, FragmentRequest};
use crate::traits::{FetchError, FragmentFetcher};
use log::{debug, warn};

/// Everything needed to review one file's diff table: the table itself,
/// the drag selection over it and the chunk expansion bookkeeping.
#[derive(Debug, Clone)]
pub struct DiffReviewableState {
    /// Which file diff this table shows.
    pub context: FileDiffContext,
    /// The rendered chunk table.
    pub table: DiffTable,
    /// Drag selection over line-number cells.
    pub selector: CommentRowSelector,
    /// Outstanding expand/collapse requests.
    pub expansion: ChunkExpansionController,
}

impl DiffReviewableState {
    pub fn new(context: FileDiffContext, table: DiffTable) -> Self {
        Self {
            context,
            table,
            selector: CommentRowSelector::new(),
            expansion: ChunkExpansionController::new(),
        }
    }

    /// Handle an action and return the events it produced.
    pub fn handle_action(&mut self, action: DiffAction) -> Vec<DiffEvent> {
        match action {
            DiffAction::PointerEnter(target) => {
                self.selector.pointer_enter(&mut self.table, target);
                Vec::new()
            }
            DiffAction::PointerLeave { target, related } => {
                self.selector
                    .pointer_leave(&mut self.table, target, related);
                Vec::new()
            }
            DiffAction::PointerDown(target) => {
                self.selector.pointer_down(&mut self.table, target);
                Vec::new()
            }
            DiffAction::PointerUp(target) => {
                match self.selector.pointer_up(&mut self.table, target) {
                    Some(SelectionOutcome::Create(range)) => vec![DiffEvent::OpenCommentEditor {
                        context: self.context.clone(),
                        range,
                    }],
                    Some(SelectionOutcome::OpenExisting {
                        row_index,
                        side,
                        line,
                    }) => vec![DiffEvent::OpenExistingComment {
                        row_index,
                        side,
                        line,
                    }],
                    None => Vec::new(),
                }
            }
            DiffAction::Expand {
                chunk_index,
                context,
            } => {
                let request = self
                    .expansion
                    .request_expand(&self.table, chunk_index, &context);
                Self::request_events(request)
            }
            DiffAction::Collapse { chunk_index } => {
                let request = self.expansion.request_collapse(&self.table, chunk_index);
                Self::request_events(request)
            }
        }
    }

    /// Apply a fetched fragment to the table.
    ///
    /// Row indices shift when the table changes, so any selection or hover
    /// state is dropped on success. Returns
    /// [`DiffEvent::ChunkExpansionChanged`] on success; on error the table
    /// and selection are unchanged and no event is produced.
    pub fn apply_fragment(
        &mut self,
        request: &FragmentRequest,
        result: Result<Fragment, FetchError>,
    ) -> Result<Vec<DiffEvent>, ExpansionError> {
        self.expansion
            .apply_fragment(&mut self.table, request, result)?;
        self.selector.reset(&mut self.table);
        Ok(vec![DiffEvent::ChunkExpansionChanged])
    }

    /// Fetch the fragment for `request` and apply it.
    pub async fn run_fragment_request<F>(
        &mut self,
        fetcher: &F,
        request: FragmentRequest,
    ) -> Result<Vec<DiffEvent>, ExpansionError>
    where
        F: FragmentFetcher + ?Sized,
    {
        debug!(
            "Fetching fragment {} for file {}",
            request.request_id, self.context.filediff_id
        );
        let result = fetcher.fetch_fragment(&self.context, &request).await;
        self.apply_fragment(&request, result)
    }

    /// Flag a row as carrying a committed comment on `side`.
    pub fn mark_comment(&mut self, row_index: usize, side: DiffSide) -> bool {
        self.table.set_comment_flag(row_index, side, true)
    }

    /// Remove a row's comment flag on `side`, e.g. after the comment was deleted.
    pub fn clear_comment(&mut self, row_index: usize, side: DiffSide) -> bool {
        self.table.set_comment_flag(row_index, side, false)
    }

    fn request_events(request: Result<FragmentRequest, ExpansionError>) -> Vec<DiffEvent> {
        match request {
            Ok(request) => vec![DiffEvent::RequestFragment(request)],
            Err(e) => {
                warn!("Ignoring expansion control: {}", e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CellKind, CellTarget, ChunkKind, CommentRange, ContextSpec, LinesOfContext, Row, RowGroup,
    };
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    fn state() -> DiffReviewableState {
        DiffReviewableState::new(
            FileDiffContext::new(0, 42, 1),
            DiffTable::new(vec![
                RowGroup::equal_run(0, 1, 5),
                RowGroup::collapsed(1, 4, vec![ContextSpec::Above(20), ContextSpec::FullChunk]),
                RowGroup::new(2, ChunkKind::Delete, (10..15).map(Row::new).collect()),
            ]),
        )
    }

    fn line_cell(row: usize) -> CellTarget {
        CellTarget::new(row, DiffSide::Right, CellKind::LineNumber)
    }

    struct StaticFetcher(Result<Fragment, FetchError>);

    #[async_trait]
    impl FragmentFetcher for StaticFetcher {
        async fn fetch_fragment(
            &self,
            _file: &FileDiffContext,
            _request: &FragmentRequest,
        ) -> Result<Fragment, FetchError> {
            self.0.clone()
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_drag_opens_comment_editor() {
        let mut state = state();

        assert!(state
            .handle_action(DiffAction::PointerDown(line_cell(4)))
            .is_empty());
        state.handle_action(DiffAction::PointerEnter(line_cell(6)));
        let events = state.handle_action(DiffAction::PointerUp(line_cell(6)));

        assert_eq!(
            events,
            vec![DiffEvent::OpenCommentEditor {
                context: FileDiffContext::new(0, 42, 1),
                range: CommentRange {
                    begin_row: 4,
                    end_row: 6,
                    begin_line: 5,
                    end_line: 11,
                    side: DiffSide::Right,
                },
            }]
        );
        assert!(state.table.selected_rows().is_empty());
    }

    #[test]
    fn test_release_on_marked_comment() {
        let mut state = state();
        assert!(state.mark_comment(2, DiffSide::Right));

        state.handle_action(DiffAction::PointerDown(line_cell(2)));
        let events = state.handle_action(DiffAction::PointerUp(line_cell(2)));
        assert_eq!(
            events,
            vec![DiffEvent::OpenExistingComment {
                row_index: 2,
                side: DiffSide::Right,
                line: 3,
            }]
        );

        assert!(state.clear_comment(2, DiffSide::Right));
        state.handle_action(DiffAction::PointerDown(line_cell(2)));
        let events = state.handle_action(DiffAction::PointerUp(line_cell(2)));
        assert!(matches!(
            events.as_slice(),
            [DiffEvent::OpenCommentEditor { .. }]
        ));
    }

    #[test]
    fn test_expand_emits_request() {
        let mut state = state();

        let events = state.handle_action(DiffAction::Expand {
            chunk_index: 1,
            context: ContextSpec::Above(20),
        });
        let [DiffEvent::RequestFragment(request)] = events.as_slice() else {
            panic!("expected a fragment request, got {:?}", events);
        };
        assert_eq!(request.chunk_index, 1);
        assert_eq!(
            request.lines_of_context,
            LinesOfContext::Range { above: 20, below: 0 }
        );

        // Nothing to collapse yet.
        assert!(state
            .handle_action(DiffAction::Collapse { chunk_index: 1 })
            .is_empty());
    }

    #[tokio::test]
    async fn test_run_fragment_request_expands_and_collapses() {
        let mut state = state();

        let events = state.handle_action(DiffAction::Expand {
            chunk_index: 1,
            context: ContextSpec::FullChunk,
        });
        let [DiffEvent::RequestFragment(request)] = events.as_slice() else {
            panic!("expected a fragment request, got {:?}", events);
        };
        let fetcher = StaticFetcher(Ok(Fragment::new(vec![RowGroup::loaded(
            1,
            (6..10).map(Row::new).collect(),
        )])));
        let events = state
            .run_fragment_request(&fetcher, request.clone())
            .await
            .unwrap();
        assert_eq!(events, vec![DiffEvent::ChunkExpansionChanged]);
        assert_eq!(state.table.row_count(), 14);
        assert_eq!(state.table.collapse_buttons(), &[1]);

        let events = state.handle_action(DiffAction::Collapse { chunk_index: 1 });
        let [DiffEvent::RequestFragment(request)] = events.as_slice() else {
            panic!("expected a fragment request, got {:?}", events);
        };
        let fetcher = StaticFetcher(Ok(Fragment::new(vec![RowGroup::collapsed(
            1,
            4,
            vec![ContextSpec::FullChunk],
        )])));
        let events = state
            .run_fragment_request(&fetcher, request.clone())
            .await
            .unwrap();
        assert_eq!(events, vec![DiffEvent::ChunkExpansionChanged]);
        assert_eq!(state.table.row_count(), 10);
        assert!(state.table.collapse_buttons().is_empty());
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_selection_and_table() {
        let mut state = state();
        state.handle_action(DiffAction::PointerEnter(line_cell(3)));

        let events = state.handle_action(DiffAction::Expand {
            chunk_index: 1,
            context: ContextSpec::FullChunk,
        });
        let [DiffEvent::RequestFragment(request)] = events.as_slice() else {
            panic!("expected a fragment request, got {:?}", events);
        };
        let before = state.table.groups().to_vec();

        let fetcher = StaticFetcher(Err(FetchError::NetworkError("timeout".to_string())));
        let result = state.run_fragment_request(&fetcher, request.clone()).await;

        assert!(matches!(result, Err(ExpansionError::Fetch { .. })));
        assert_eq!(state.table.groups(), before.as_slice());
        assert_eq!(state.table.selected_rows(), vec![3]);
    }

    #[test]
    fn test_successful_apply_resets_selection() {
        let mut state = state();
        let events = state.handle_action(DiffAction::Expand {
            chunk_index: 1,
            context: ContextSpec::FullChunk,
        });
        let [DiffEvent::RequestFragment(request)] = events.as_slice() else {
            panic!("expected a fragment request, got {:?}", events);
        };

        state.handle_action(DiffAction::PointerDown(line_cell(1)));
        state.handle_action(DiffAction::PointerEnter(line_cell(7)));
        assert!(state.selector.is_selecting());

        let events = state
            .apply_fragment(
                request,
                Ok(Fragment::new(vec![RowGroup::loaded(1, vec![Row::new(6)])])),
            )
            .unwrap();
        assert_eq!(events, vec![DiffEvent::ChunkExpansionChanged]);
        assert!(!state.selector.is_selecting());
        assert!(state.table.selected_rows().is_empty());

        // Releasing afterwards creates nothing.
        assert!(state
            .handle_action(DiffAction::PointerUp(line_cell(2)))
            .is_empty());
    }
}
