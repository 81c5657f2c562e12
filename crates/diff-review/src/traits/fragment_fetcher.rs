//! Trait for fetching rendered diff fragments.

use crate::model::{FileDiffContext, Fragment, FragmentRequest};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when fetching a fragment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The requested chunk does not exist on the server.
    #[error("Chunk not found: {0}")]
    ChunkNotFound(usize),

    /// A network error occurred.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The server answered with something that is not a fragment.
    #[error("Invalid fragment: {0}")]
    InvalidFragment(String),

    /// The fetcher is not available.
    #[error("Fragment fetcher unavailable: {0}")]
    Unavailable(String),
}

/// Fetches rendered fragments of a diff table for expansion and collapse.
///
/// Implementations talk to whatever backend renders the diff. No retries,
/// cancellation or timeouts are expected from the caller; those belong here.
///
/// # Example
///
/// ```ignore
/// struct HttpFragmentFetcher {
///     client: reqwest::Client,
///     base_url: String,
/// }
///
/// #[async_trait]
/// impl FragmentFetcher for HttpFragmentFetcher {
///     async fn fetch_fragment(
///         &self,
///         file: &FileDiffContext,
///         request: &FragmentRequest,
///     ) -> Result<Fragment, FetchError> {
///         let url = format!(
///             "{}/fragment/{}/chunk/{}/?lines-of-context={}",
///             self.base_url, file.filediff_id, request.chunk_index, request.lines_of_context
///         );
///         let response = self.client.get(url).send().await
///             .map_err(|e| FetchError::NetworkError(e.to_string()))?;
///         response.json().await.map_err(|e| FetchError::InvalidFragment(e.to_string()))
///     }
///
///     fn is_available(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait FragmentFetcher: Send + Sync {
    /// Fetch the fragment that replaces the requested chunk.
    ///
    /// # Arguments
    /// * `file` - The file diff the chunk belongs to
    /// * `request` - Chunk index and requested context
    async fn fetch_fragment(
        &self,
        file: &FileDiffContext,
        request: &FragmentRequest,
    ) -> Result<Fragment, FetchError>;

    /// Check if the fetcher can currently be used.
    fn is_available(&self) -> bool;
}

/// A fetcher for read-only tables where expansion is disabled.
#[allow(dead_code)]
pub struct NoOpFragmentFetcher;

#[async_trait]
impl FragmentFetcher for NoOpFragmentFetcher {
    async fn fetch_fragment(
        &self,
        _file: &FileDiffContext,
        _request: &FragmentRequest,
    ) -> Result<Fragment, FetchError> {
        Err(FetchError::Unavailable(
            "Chunk expansion is disabled".to_string(),
        ))
    }

    fn is_available(&self) -> bool {
        false
    }
}
