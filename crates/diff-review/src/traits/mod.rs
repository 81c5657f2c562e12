//! Collaborator traits the review state talks to.

mod fragment_fetcher;
mod waveform_player;

pub use fragment_fetcher::{FetchError, FragmentFetcher, NoOpFragmentFetcher};
pub use waveform_player::{RegionId, RegionSpan, WaveformPlayer};
