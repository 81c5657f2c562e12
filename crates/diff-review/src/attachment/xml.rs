//! XML attachment review: text review plus the "render on same line" option.

use super::comment_block::{lenient_bool, FileAttachmentReviewable, RegionFields};
use super::text::{TextRegion, TextReviewableState, ViewMode};
use super::xml_format::{render_xml_lines, XmlFormatError};
use crate::event::AttachmentEvent;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A line range in an XML attachment, tied to how text content was laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XmlRegion {
    #[serde(flatten)]
    pub text: TextRegion,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub render_text_content_on_same_line: bool,
}

/// The render options checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlRenderOptions {
    pub render_text_on_same_line: bool,
    pub visible: bool,
}

impl Default for XmlRenderOptions {
    fn default() -> Self {
        Self {
            render_text_on_same_line: false,
            visible: true,
        }
    }
}

impl XmlRenderOptions {
    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }
}

/// Review state for an XML attachment.
#[derive(Debug, Clone)]
pub struct XmlReviewableState {
    pub text: TextReviewableState,
    pub options: XmlRenderOptions,
}

impl XmlReviewableState {
    pub fn new(
        reviewable: FileAttachmentReviewable,
        has_rendered_view: bool,
        view_mode: ViewMode,
    ) -> Self {
        Self {
            text: TextReviewableState::new(reviewable, has_rendered_view, view_mode),
            options: XmlRenderOptions::default(),
        }
    }

    /// Change the "render on same line" option and reload the content.
    ///
    /// Does nothing if the value is unchanged or a reload is in flight.
    pub fn set_render_text_on_same_line(&mut self, value: bool) -> Option<AttachmentEvent> {
        if value == self.options.render_text_on_same_line || !self.text.render_options_enabled() {
            return None;
        }
        self.options.render_text_on_same_line = value;

        let mut extra = Map::new();
        extra.insert("renderTextContentOnSameLine".to_string(), Value::Bool(value));
        Some(self.text.reload_content(self.text.view_mode(), extra))
    }

    pub fn finish_reload(&mut self, result: Result<String, String>) -> Vec<AttachmentEvent> {
        self.text.finish_reload(result)
    }

    /// Lines of the rendered view for `xml`, laid out per the current options.
    pub fn render_lines(&self, xml: &str) -> Result<Vec<String>, XmlFormatError> {
        render_xml_lines(xml, self.options.render_text_on_same_line)
    }

    /// Whether a comment block belongs in the current view and layout.
    pub fn should_render_comment_block(&self, fields: &RegionFields) -> bool {
        match fields {
            RegionFields::Xml(region) => {
                region.text.view_mode == self.text.view_mode()
                    && region.render_text_content_on_same_line
                        == self.options.render_text_on_same_line
            }
            _ => false,
        }
    }
}
