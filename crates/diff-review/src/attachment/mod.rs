//! Comment regions on file attachments (audio, text and XML) and the
//! rendered views of XML and notebook attachments.

mod audio;
mod comment_block;
mod notebook;
mod text;
mod xml;
mod xml_format;

pub use audio::{
    format_timestamp, group_audio_comments, revision_redirect_url, timeline_interval,
    AudioPlayerController, AudioPlayerSettings, AudioRegion, AudioReviewError,
    AudioReviewableController, AudioReviewableOptions, RevisionSide, DEFAULT_PLAYBACK_SPEED,
    DEFAULT_VOLUME, PLAYBACK_SPEED_OPTIONS,
};
pub use comment_block::{
    AttachmentInfo, AttachmentKind, CommentBlock, FieldError, FileAttachmentReviewable,
    RegionFields, SerializedComment,
};
pub use notebook::{
    render_notebook, render_notebook_json, Cell, MultilineText, Notebook, NotebookError, Output,
};
pub use text::{ContentReloadRequest, TextRegion, TextReviewableState, UnknownViewMode, ViewMode};
pub use xml::{XmlRegion, XmlRenderOptions, XmlReviewableState};
pub use xml_format::{
    decode_xml, encoding_from_declaration, prettify_xml, render_xml_lines, xml_declaration,
    XmlFormatError,
};
