//! Trait for the audio waveform player backing an audio review UI.

/// Identifier the waveform player assigns to a region.
pub type RegionId = u64;

/// A time span on the waveform, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpan {
    pub start: f64,
    pub end: f64,
}

/// The waveform rendering/playback library.
///
/// Regions created through this trait are neither draggable nor resizable;
/// new regions drawn by the user arrive through
/// [`AudioPlayerController::on_region_created`](crate::attachment::AudioPlayerController::on_region_created).
pub trait WaveformPlayer {
    /// Start loading the audio at `url`.
    fn load(&mut self, url: &str);

    fn set_volume(&mut self, volume: f64);

    fn set_playback_rate(&mut self, rate: f64);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Add a fixed region and return its ID.
    fn add_region(&mut self, span: RegionSpan) -> RegionId;

    fn remove_region(&mut self, id: RegionId);

    /// Play just the given region.
    fn play_region(&mut self, id: RegionId);

    /// Allow or disallow drawing new regions by dragging.
    fn set_drag_selection(&mut self, enabled: bool);
}
