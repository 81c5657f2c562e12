//! Attachment defaults taken from the config, and the rendered/source
//! preview of attachment files.

use anyhow::{Context, Result};
use diff_review::attachment::{
    decode_xml, render_notebook_json, render_xml_lines, AudioPlayerSettings, ViewMode,
};
use diff_review_config::AppConfig;
use serde_json::{json, Value};
use std::path::Path;

/// How attachments open before the user changes anything.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentDefaults {
    pub view_mode: ViewMode,
    pub audio: AudioPlayerSettings,
}

impl AttachmentDefaults {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let view_mode = config
            .default_view_mode
            .parse::<ViewMode>()
            .context("Invalid default_view_mode in config")?;

        Ok(Self {
            view_mode,
            audio: AudioPlayerSettings::new(config.audio.volume, config.audio.playback_speed),
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "view_mode": self.view_mode.as_str(),
            "volume": self.audio.volume,
            "playback_speed": self.audio.playback_speed,
        })
    }
}

/// Lines shown for an attachment file in `view_mode`.
///
/// The rendered view prettifies XML and renders notebooks; other files and
/// the source view show the text as is.
pub fn preview_attachment(
    path: &Path,
    view_mode: ViewMode,
    render_text_on_same_line: bool,
) -> Result<Vec<String>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let lines = match (view_mode, extension.as_str()) {
        (ViewMode::Rendered, "xml") => {
            render_xml_lines(&decode_xml(&bytes)?, render_text_on_same_line)?
        }
        (ViewMode::Rendered, "ipynb") => render_notebook_json(&String::from_utf8(bytes)?)?,
        _ => String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect(),
    };

    log::info!(
        "Previewed {} in {} mode: {} line(s)",
        path.display(),
        view_mode,
        lines.len()
    );
    Ok(lines)
}
