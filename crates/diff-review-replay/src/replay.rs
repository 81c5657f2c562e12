//! Drive a review state through a list of actions, answering fragment
//! requests as they are emitted.

use anyhow::Result;
use diff_review::{DiffAction, DiffEvent, DiffReviewableState, FragmentFetcher};
use serde_json::json;
use std::io::Write;

/// Counts reported after a replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub actions: usize,
    pub events: usize,
    pub failed_fetches: usize,
}

/// Dispatch `actions` in order, writing every event as one JSON line.
///
/// Fragment requests are fetched and applied before the next action is
/// dispatched. Failed fetches are written as `expansion_failed` lines.
pub async fn replay<F, W>(
    state: &mut DiffReviewableState,
    fetcher: &F,
    actions: Vec<DiffAction>,
    out: &mut W,
) -> Result<ReplaySummary>
where
    F: FragmentFetcher + ?Sized,
    W: Write,
{
    let mut summary = ReplaySummary::default();

    for action in actions {
        log::debug!("Dispatching {:?}", action);
        summary.actions += 1;

        for event in state.handle_action(action) {
            write_event(out, &event)?;
            summary.events += 1;

            let DiffEvent::RequestFragment(request) = event else {
                continue;
            };

            match state.run_fragment_request(fetcher, request.clone()).await {
                Ok(events) => {
                    for event in &events {
                        write_event(out, event)?;
                    }
                    summary.events += events.len();
                }
                Err(e) => {
                    log::warn!("Fragment request {} failed: {}", request.request_id, e);
                    summary.failed_fetches += 1;
                    let line = json!({
                        "type": "expansion_failed",
                        "request_id": request.request_id,
                        "chunk_index": request.chunk_index,
                        "error": e.to_string(),
                    });
                    writeln!(out, "{}", line)?;
                }
            }
        }
    }

    Ok(summary)
}

fn write_event<W: Write>(out: &mut W, event: &DiffEvent) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(event)?)?;
    Ok(())
}
