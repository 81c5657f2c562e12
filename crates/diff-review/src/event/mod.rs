//! Events emitted to the embedding application.

mod attachment_event;
mod diff_event;

pub use attachment_event::AttachmentEvent;
pub use diff_event::DiffEvent;
