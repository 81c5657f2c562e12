//! Replay scripts: a table, the actions to dispatch and the fragments the
//! scripted fetcher answers with.

use anyhow::{Context, Result};
use async_trait::async_trait;
use diff_review::{
    DiffAction, FetchError, FileDiffContext, Fragment, FragmentFetcher, FragmentRequest, RowGroup,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::path::Path;
use tokio::sync::Mutex;

/// A recorded review session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplayScript {
    /// The file diff the table belongs to.
    #[serde(default)]
    pub context: FileDiffContext,

    /// Initial table. May be omitted when a diff file is given instead.
    #[serde(default)]
    pub groups: Vec<RowGroup>,

    /// Actions dispatched in order.
    #[serde(default)]
    pub actions: Vec<DiffAction>,

    /// Answers for fragment requests, consumed in order per chunk.
    #[serde(default)]
    pub fragments: Vec<ScriptedFragment>,
}

/// One scripted answer to a fragment request.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptedFragment {
    pub chunk_index: usize,

    #[serde(default)]
    pub groups: Vec<RowGroup>,

    /// Fail the fetch with this message instead of returning `groups`.
    #[serde(default)]
    pub error: Option<String>,
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid script {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Answers fragment requests from a script.
pub struct ScriptedFetcher {
    fragments: Mutex<VecDeque<ScriptedFragment>>,
}

impl ScriptedFetcher {
    pub fn new(fragments: Vec<ScriptedFragment>) -> Self {
        Self {
            fragments: Mutex::new(fragments.into()),
        }
    }
}

#[async_trait]
impl FragmentFetcher for ScriptedFetcher {
    async fn fetch_fragment(
        &self,
        _file: &FileDiffContext,
        request: &FragmentRequest,
    ) -> Result<Fragment, FetchError> {
        let mut fragments = self.fragments.lock().await;
        let position = fragments
            .iter()
            .position(|f| f.chunk_index == request.chunk_index)
            .ok_or(FetchError::ChunkNotFound(request.chunk_index))?;

        let Some(scripted) = fragments.remove(position) else {
            return Err(FetchError::ChunkNotFound(request.chunk_index));
        };

        match scripted.error {
            Some(message) => Err(FetchError::NetworkError(message)),
            None => Ok(Fragment::new(scripted.groups)),
        }
    }

    fn is_available(&self) -> bool {
        true
    }
}
