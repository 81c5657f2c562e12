//! Events emitted by attachment review controllers.

use crate::attachment::{ContentReloadRequest, ViewMode};
use crate::traits::RegionId;
use uuid::Uuid;

/// Events emitted by the audio, text and XML review controllers.
#[derive(Debug, Clone, PartialEq)]
pub enum AttachmentEvent {
    /// An audio player finished loading its file.
    FileLoaded,

    /// The user drew a new region on an audio waveform.
    RegionCreated {
        region_id: RegionId,
        start: f64,
        end: f64,
    },

    /// Open the comment dialog of an existing comment block.
    OpenComment(Uuid),

    /// A region is being played back.
    PlayRegion(RegionId),

    /// Show an error message to the user.
    Alert(String),

    /// A comment block was created for a new region; open its editor.
    CommentRegionCreated(Uuid),

    /// A comment block and its region were removed.
    CommentRegionRemoved(Uuid),

    /// Fetch re-rendered content with these options.
    ContentReloadRequested(ContentReloadRequest),

    /// New content arrived for a view mode.
    ContentReloaded { view_mode: ViewMode, html: String },

    /// Navigate to another revision of the attachment.
    Redirect(String),
}
