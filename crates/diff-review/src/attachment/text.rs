//! Text attachment review: line-range comment regions in a rendered or
//! source view, and reloading that view from the server.

use super::comment_block::{lenient_u32, FileAttachmentReviewable, RegionFields};
use crate::event::AttachmentEvent;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How a text attachment is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Rendered by a server-side renderer (e.g. Markdown to HTML).
    Rendered,
    /// Raw source lines.
    #[default]
    Source,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Rendered => "rendered",
            ViewMode::Source => "source",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown view mode: {0:?}")]
pub struct UnknownViewMode(pub String);

impl FromStr for ViewMode {
    type Err = UnknownViewMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rendered" => Ok(ViewMode::Rendered),
            "source" => Ok(ViewMode::Source),
            other => Err(UnknownViewMode(other.to_string())),
        }
    }
}

/// A line range in one view mode of a text attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRegion {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub begin_line_num: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub end_line_num: Option<u32>,
    #[serde(default)]
    pub view_mode: ViewMode,
}

/// A request to re-render the attachment's content.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentReloadRequest {
    pub view_mode: ViewMode,
    /// Request data: `{"type": <mode>, ...extra}`.
    pub data: Map<String, Value>,
}

/// Review state for a text-based attachment.
#[derive(Debug, Clone)]
pub struct TextReviewableState {
    pub reviewable: FileAttachmentReviewable,
    view_mode: ViewMode,
    has_rendered_view: bool,
    render_options_enabled: bool,
    pending_reload: Option<ContentReloadRequest>,
    rendered_content: Option<String>,
    source_content: Option<String>,
}

impl TextReviewableState {
    pub fn new(
        reviewable: FileAttachmentReviewable,
        has_rendered_view: bool,
        view_mode: ViewMode,
    ) -> Self {
        let view_mode = if has_rendered_view {
            view_mode
        } else {
            ViewMode::Source
        };

        Self {
            reviewable,
            view_mode,
            has_rendered_view,
            render_options_enabled: true,
            pending_reload: None,
            rendered_content: None,
            source_content: None,
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn has_rendered_view(&self) -> bool {
        self.has_rendered_view
    }

    /// Switch view modes. The rendered view is only available when the
    /// attachment has one.
    pub fn set_view_mode(&mut self, mode: ViewMode) -> bool {
        if mode == ViewMode::Rendered && !self.has_rendered_view {
            return false;
        }
        self.view_mode = mode;
        true
    }

    /// Whether render option controls accept input. Disabled while a
    /// reload is in flight.
    pub fn render_options_enabled(&self) -> bool {
        self.render_options_enabled
    }

    pub fn is_reloading(&self) -> bool {
        self.pending_reload.is_some()
    }

    /// Last content received for `mode`.
    pub fn content(&self, mode: ViewMode) -> Option<&str> {
        match mode {
            ViewMode::Rendered => self.rendered_content.as_deref(),
            ViewMode::Source => self.source_content.as_deref(),
        }
    }

    /// Request new content for `mode`, with `extra` render options merged
    /// into the request data.
    pub fn reload_content(&mut self, mode: ViewMode, extra: Map<String, Value>) -> AttachmentEvent {
        let mut data = Map::new();
        data.insert("type".to_string(), Value::String(mode.as_str().to_string()));
        data.extend(extra);

        let request = ContentReloadRequest {
            view_mode: mode,
            data,
        };
        debug!("Reloading {} content: {:?}", mode, request.data);

        self.render_options_enabled = false;
        self.pending_reload = Some(request.clone());
        AttachmentEvent::ContentReloadRequested(request)
    }

    /// The reload finished, successfully with the new HTML or with an error.
    ///
    /// Render options are re-enabled either way.
    pub fn finish_reload(&mut self, result: Result<String, String>) -> Vec<AttachmentEvent> {
        self.render_options_enabled = true;
        let Some(request) = self.pending_reload.take() else {
            warn!("Content reload finished with none pending");
            return Vec::new();
        };

        match result {
            Ok(html) => {
                let slot = match request.view_mode {
                    ViewMode::Rendered => &mut self.rendered_content,
                    ViewMode::Source => &mut self.source_content,
                };
                *slot = Some(html.clone());
                vec![AttachmentEvent::ContentReloaded {
                    view_mode: request.view_mode,
                    html,
                }]
            }
            Err(message) => {
                error!("Failed to reload {} content: {}", request.view_mode, message);
                vec![AttachmentEvent::Alert(message)]
            }
        }
    }

    /// Whether a comment block belongs in the current view.
    pub fn should_render_comment_block(&self, fields: &RegionFields) -> bool {
        match fields {
            RegionFields::Text(region) => region.view_mode == self.view_mode,
            RegionFields::Xml(region) => region.text.view_mode == self.view_mode,
            RegionFields::Audio(_) => false,
        }
    }
}
