//! Incremental expansion and collapse of diff chunks.
//!
//! Expanding or collapsing is split into two halves so that several fetches
//! can be in flight at once:
//!
//! 1. [`ChunkExpansionController::request_expand`] /
//!    [`ChunkExpansionController::request_collapse`] validate the target and
//!    build a [`FragmentRequest`].
//! 2. Once the fetch completes, [`ChunkExpansionController::apply_fragment`]
//!    splices the result into the table and merges it with neighbouring
//!    expanded chunks.
//!
//! Responses are applied in whatever order they arrive and nothing tracks
//! or cancels outstanding requests. A response whose target group has since
//! disappeared is rejected without touching the table.

use crate::model::{
    ContextSpec, DiffTable, ExpansionState, Fragment, FragmentRequest, LinesOfContext, RowGroup,
};
use crate::traits::FetchError;
use log::{debug, warn};
use std::ops::Range;
use thiserror::Error;

/// Errors from expanding or collapsing a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// No collapsed placeholder carries this chunk index.
    #[error("Chunk {0} is not collapsed")]
    NotCollapsed(usize),

    /// No expanded group with a collapse control carries this chunk index.
    #[error("Chunk {0} is not expanded")]
    NotExpanded(usize),

    /// The group a response was meant for is no longer in the table.
    #[error("Chunk {0} is no longer in the table")]
    ChunkNotFound(usize),

    /// The fetcher returned no row groups.
    #[error("Empty fragment returned for chunk {0}")]
    EmptyFragment(usize),

    /// The fetch itself failed.
    #[error("Failed to fetch fragment for chunk {chunk_index}: {source}")]
    Fetch {
        chunk_index: usize,
        #[source]
        source: FetchError,
    },
}

/// Builds fragment requests and applies their responses to a [`DiffTable`].
#[derive(Debug, Clone, Default)]
pub struct ChunkExpansionController {
    next_request_id: u64,
}

impl ChunkExpansionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request expanding the collapsed chunk `chunk_index`.
    ///
    /// A [`ContextSpec::Collapse`] is treated as [`Self::request_collapse`].
    pub fn request_expand(
        &mut self,
        table: &DiffTable,
        chunk_index: usize,
        context: &ContextSpec,
    ) -> Result<FragmentRequest, ExpansionError> {
        if context.is_collapse() {
            return self.request_collapse(table, chunk_index);
        }

        table
            .find_placeholder(chunk_index)
            .ok_or(ExpansionError::NotCollapsed(chunk_index))?;

        Ok(self.issue(chunk_index, context.lines_of_context()))
    }

    /// Build a request collapsing the expanded chunk `chunk_index`.
    pub fn request_collapse(
        &mut self,
        table: &DiffTable,
        chunk_index: usize,
    ) -> Result<FragmentRequest, ExpansionError> {
        table
            .find_collapsible(chunk_index)
            .ok_or(ExpansionError::NotExpanded(chunk_index))?;

        Ok(self.issue(chunk_index, LinesOfContext::Zero))
    }

    /// Apply the result of fetching `request`.
    ///
    /// On success the target group is replaced by the fragment's groups,
    /// every contiguous loaded `equal` group directly before or after them
    /// is removed, and only the first collapse control in the inserted
    /// range is kept. Placeholders left by a partial (above/below) reveal are
    /// marked [`ExpansionState::PartiallyExpanded`]. Returns the positions of
    /// the inserted groups.
    ///
    /// On any error the table is left untouched.
    pub fn apply_fragment(
        &mut self,
        table: &mut DiffTable,
        request: &FragmentRequest,
        result: Result<Fragment, FetchError>,
    ) -> Result<Range<usize>, ExpansionError> {
        let chunk_index = request.chunk_index;

        let fragment = result.map_err(|source| {
            warn!("Fragment fetch for chunk {} failed: {}", chunk_index, source);
            ExpansionError::Fetch {
                chunk_index,
                source,
            }
        })?;

        let target = if request.is_collapse() {
            table.find_collapsible(chunk_index)
        } else {
            table.find_placeholder(chunk_index)
        };
        let Some(position) = target else {
            warn!(
                "Discarding fragment for chunk {} (request {}): target is gone",
                chunk_index, request.request_id
            );
            return Err(ExpansionError::ChunkNotFound(chunk_index));
        };

        if fragment.is_empty() {
            warn!("Empty fragment for chunk {}", chunk_index);
            return Err(ExpansionError::EmptyFragment(chunk_index));
        }

        let mut range = table.splice(position, fragment.groups);
        let absorbed = Self::absorb_neighbours(table, &mut range);
        Self::dedup_collapse_controls(table, range.clone());
        if matches!(request.lines_of_context, LinesOfContext::Range { .. }) {
            Self::mark_partially_expanded(table, range.clone());
        }
        table.refresh_collapse_buttons();

        debug!(
            "Applied fragment for chunk {} ({}): {} group(s) inserted, {} neighbour(s) merged",
            chunk_index,
            request.lines_of_context,
            range.len(),
            absorbed
        );
        Ok(range)
    }

    fn issue(&mut self, chunk_index: usize, lines_of_context: LinesOfContext) -> FragmentRequest {
        self.next_request_id += 1;
        let request_id = self.next_request_id;

        debug!(
            "Requesting fragment {} for chunk {} (context {:?})",
            request_id,
            chunk_index,
            lines_of_context.to_string()
        );
        FragmentRequest {
            request_id,
            chunk_index,
            lines_of_context,
        }
    }

    /// Remove loaded `equal` groups on both sides of `range`, however many
    /// there are; the fragment already contains their rows.
    fn absorb_neighbours(table: &mut DiffTable, range: &mut Range<usize>) -> usize {
        let mut absorbed = 0;

        while range.start > 0
            && table
                .group(range.start - 1)
                .is_some_and(RowGroup::is_mergeable)
        {
            table.remove_group(range.start - 1);
            range.start -= 1;
            range.end -= 1;
            absorbed += 1;
        }

        while table.group(range.end).is_some_and(RowGroup::is_mergeable) {
            table.remove_group(range.end);
            absorbed += 1;
        }

        absorbed
    }

    fn mark_partially_expanded(table: &mut DiffTable, range: Range<usize>) {
        for position in range {
            if let Some(group) = table.group_mut(position) {
                if group.is_placeholder() {
                    group.expansion = ExpansionState::PartiallyExpanded;
                }
            }
        }
    }

    fn dedup_collapse_controls(table: &mut DiffTable, range: Range<usize>) {
        let mut seen = false;
        for position in range {
            if let Some(group) = table.group_mut(position) {
                if group.has_collapse_affordance {
                    group.has_collapse_affordance = !seen;
                    seen = true;
                }
            }
        }
    }
}
