//! Audio attachment review: time-range comment regions on a waveform.

use super::comment_block::{
    lenient_bool, lenient_f64, FieldError, FileAttachmentReviewable, RegionFields,
    SerializedComment,
};
use crate::event::AttachmentEvent;
use crate::traits::{RegionId, RegionSpan, WaveformPlayer};
use chrono::DateTime;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Speeds offered by the playback speed selector.
pub const PLAYBACK_SPEED_OPTIONS: [f64; 10] = [0.1, 0.25, 0.4, 0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 5.0];

pub const DEFAULT_PLAYBACK_SPEED: f64 = 1.0;

pub const DEFAULT_VOLUME: f64 = 0.5;

/// Seconds between timeline labels at the given zoom level.
pub fn timeline_interval(px_per_sec: f64) -> f64 {
    if px_per_sec >= 2500.0 {
        0.01
    } else if px_per_sec >= 1000.0 {
        0.025
    } else if px_per_sec >= 250.0 {
        0.1
    } else if px_per_sec >= 100.0 {
        0.25
    } else if px_per_sec >= 25.0 {
        1.0
    } else if px_per_sec * 5.0 >= 25.0 {
        5.0
    } else if px_per_sec * 15.0 >= 25.0 {
        15.0
    } else {
        (0.5 / px_per_sec).ceil() * 60.0
    }
}

/// Format seconds as `mm:ss.SSS`.
pub fn format_timestamp(seconds: f64) -> String {
    let millis = (seconds.max(0.0) * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%M:%S%.3f").to_string())
        .unwrap_or_else(|| "00:00.000".to_string())
}

fn default_true() -> bool {
    true
}

/// A time range on one revision of an audio file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRegion {
    /// Start time in seconds.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub start: Option<f64>,
    /// End time in seconds.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub end: Option<f64>,
    /// Whether the region was drawn on the earlier revision of a diff.
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub attached_to_earlier_revision: bool,
}

impl Default for AudioRegion {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            attached_to_earlier_revision: true,
        }
    }
}

impl AudioRegion {
    /// The region's span, if both ends are known.
    pub fn span(&self) -> Option<RegionSpan> {
        Some(RegionSpan {
            start: self.start?,
            end: self.end?,
        })
    }

    /// Label shown on the region's flag, e.g. `00:01.500 - 00:03.250`.
    pub fn flag_text(&self) -> String {
        format!(
            "{} - {}",
            format_timestamp(self.start.unwrap_or_default()),
            format_timestamp(self.end.unwrap_or_default())
        )
    }
}

/// Group serialized comments by region.
///
/// Keys look like `1.5x3-false`. Comments without a start, end or revision
/// field predate region support and are skipped. Groups keep the order in
/// which their first comment appeared.
pub fn group_audio_comments(
    comments: Vec<SerializedComment>,
) -> Vec<(String, Vec<SerializedComment>)> {
    fn key_part(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    let mut groups: Vec<(String, Vec<SerializedComment>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for comment in comments {
        let (Some(start), Some(end), Some(earlier)) = (
            comment.fields.get("start"),
            comment.fields.get("end"),
            comment.fields.get("attachedToEarlierRevision"),
        ) else {
            debug!("Skipping comment {} without a region", comment.comment_id);
            continue;
        };

        let key = format!(
            "{}x{}-{}",
            key_part(start),
            key_part(end),
            key_part(earlier)
        );
        match index.get(&key) {
            Some(&i) => groups[i].1.push(comment),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![comment]));
            }
        }
    }

    groups
}

/// Player settings, adjusted through the volume slider and speed selector.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioPlayerSettings {
    pub volume: f64,
    pub playback_speed: f64,
    pub audio_url: String,
}

impl Default for AudioPlayerSettings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            playback_speed: DEFAULT_PLAYBACK_SPEED,
            audio_url: String::new(),
        }
    }
}

impl AudioPlayerSettings {
    /// Initial settings for a player. Volume is clamped to `0.0..=1.0`; a
    /// speed that is not positive falls back to the default.
    pub fn new(volume: f64, playback_speed: f64) -> Self {
        let volume = if volume.is_nan() {
            DEFAULT_VOLUME
        } else {
            volume.clamp(0.0, 1.0)
        };
        let playback_speed = if playback_speed.is_finite() && playback_speed > 0.0 {
            playback_speed
        } else {
            warn!("Ignoring playback speed {}", playback_speed);
            DEFAULT_PLAYBACK_SPEED
        };

        Self {
            volume,
            playback_speed,
            audio_url: String::new(),
        }
    }

    pub fn with_audio_url(mut self, url: impl Into<String>) -> Self {
        self.audio_url = url.into();
        self
    }
}

/// Drives one waveform player: loading, transport controls and the
/// comment regions drawn on it.
///
/// At most one region can be in progress (drawn but not yet attached to a
/// comment block) at a time.
#[derive(Debug)]
pub struct AudioPlayerController<P: WaveformPlayer> {
    player: P,
    settings: AudioPlayerSettings,
    file_loaded: bool,
    loading: bool,
    controls_visible: bool,
    spectrogram_visible: bool,
    showing_pause: bool,
    current_region: Option<RegionId>,
    comment_regions: Vec<(RegionId, Uuid)>,
}

impl<P: WaveformPlayer> AudioPlayerController<P> {
    pub fn new(player: P, settings: AudioPlayerSettings) -> Self {
        Self {
            player,
            settings,
            file_loaded: false,
            loading: false,
            controls_visible: false,
            spectrogram_visible: false,
            showing_pause: false,
            current_region: None,
            comment_regions: Vec::new(),
        }
    }

    /// Apply settings and start loading the audio.
    pub fn render(&mut self) {
        self.player.set_volume(self.settings.volume);
        self.player.set_playback_rate(self.settings.playback_speed);
        self.player.load(&self.settings.audio_url);
        self.loading = true;
        debug!("Loading audio from {}", self.settings.audio_url);
    }

    // === Accessors ===

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn settings(&self) -> &AudioPlayerSettings {
        &self.settings
    }

    pub fn has_loaded(&self) -> bool {
        self.file_loaded
    }

    /// Whether the loading spinner is shown.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn spectrogram_visible(&self) -> bool {
        self.spectrogram_visible
    }

    /// Whether the pause button is shown in place of the play button.
    pub fn is_showing_pause(&self) -> bool {
        self.showing_pause
    }

    /// The drawn region still waiting for its comment block.
    pub fn current_region(&self) -> Option<RegionId> {
        self.current_region
    }

    pub fn region_for_comment(&self, block_id: Uuid) -> Option<RegionId> {
        self.comment_regions
            .iter()
            .find(|(_, id)| *id == block_id)
            .map(|(region, _)| *region)
    }

    // === Player callbacks ===

    pub fn on_load_started(&mut self) {
        self.loading = true;
    }

    /// The audio finished loading: reveal controls and allow drawing regions.
    pub fn on_file_loaded(&mut self) -> Vec<AttachmentEvent> {
        self.loading = false;
        self.controls_visible = true;

        self.player.set_drag_selection(false);
        self.player.set_drag_selection(true);

        self.file_loaded = true;
        vec![AttachmentEvent::FileLoaded]
    }

    pub fn on_error(&mut self, message: &str) -> Vec<AttachmentEvent> {
        self.loading = false;
        error!("Failed to load audio {}: {}", self.settings.audio_url, message);
        vec![AttachmentEvent::Alert(format!(
            "An error occurred while loading the audio file:\n{}",
            message
        ))]
    }

    pub fn on_finished(&mut self) {
        self.showing_pause = false;
    }

    /// The user finished drawing a region.
    pub fn on_region_created(&mut self, region_id: RegionId, span: RegionSpan) -> Vec<AttachmentEvent> {
        if self.current_region.is_some() {
            debug!("Discarding region {}: another is in progress", region_id);
            self.player.remove_region(region_id);
            return Vec::new();
        }

        self.current_region = Some(region_id);
        vec![AttachmentEvent::RegionCreated {
            region_id,
            start: span.start,
            end: span.end,
        }]
    }

    /// A region was clicked. Shift-click plays it; a plain click opens its
    /// comment unless a region is still in progress.
    pub fn on_region_clicked(&mut self, region_id: RegionId, shift: bool) -> Vec<AttachmentEvent> {
        if shift {
            self.player.play_region(region_id);
            return vec![AttachmentEvent::PlayRegion(region_id)];
        }
        if self.current_region.is_some() {
            return Vec::new();
        }

        self.comment_regions
            .iter()
            .find(|(region, _)| *region == region_id)
            .map(|(_, block_id)| vec![AttachmentEvent::OpenComment(*block_id)])
            .unwrap_or_default()
    }

    // === Comments ===

    /// Attach a comment block to the in-progress region, or draw a fixed
    /// region for it. Returns false if the region has no span to draw.
    pub fn add_comment(&mut self, block_id: Uuid, region: &AudioRegion) -> bool {
        if let Some(current) = self.current_region.take() {
            self.comment_regions.push((current, block_id));
            return true;
        }

        let Some(span) = region.span() else {
            warn!("Comment block {} has no time range", block_id);
            return false;
        };
        let region_id = self.player.add_region(span);
        self.comment_regions.push((region_id, block_id));
        true
    }

    /// Remove the in-progress region if there is one, otherwise the
    /// region belonging to `block_id`.
    pub fn remove_comment(&mut self, block_id: Uuid) {
        if let Some(current) = self.current_region.take() {
            self.player.remove_region(current);
            return;
        }

        if let Some(position) = self.comment_regions.iter().position(|(_, id)| *id == block_id) {
            let (region_id, _) = self.comment_regions.remove(position);
            self.player.remove_region(region_id);
        }
    }

    // === Controls ===

    pub fn play(&mut self) {
        if self.player.is_playing() {
            return;
        }
        self.player.play();
        self.showing_pause = true;
    }

    pub fn pause(&mut self) {
        if !self.player.is_playing() {
            return;
        }
        self.player.pause();
        self.showing_pause = false;
    }

    pub fn set_volume(&mut self, volume: f64) {
        let volume = volume.clamp(0.0, 1.0);
        self.settings.volume = volume;
        self.player.set_volume(volume);
    }

    pub fn set_playback_speed(&mut self, speed: f64) {
        self.settings.playback_speed = speed;
        self.player.set_playback_rate(speed);
    }

    pub fn set_spectrogram_visible(&mut self, visible: bool) {
        self.spectrogram_visible = visible;
    }
}

/// Which revision's player a comment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionSide {
    /// The revision being diffed against.
    Earlier,
    /// The revision under review.
    Later,
}

impl RevisionSide {
    fn of(region: &AudioRegion) -> Self {
        if region.attached_to_earlier_revision {
            RevisionSide::Earlier
        } else {
            RevisionSide::Later
        }
    }
}

/// Errors rendering an audio reviewable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioReviewError {
    #[error("These revisions cannot be compared because they are different file types.")]
    DiffTypeMismatch,
}

/// Page data for an audio reviewable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioReviewableOptions {
    pub audio_url: String,
    /// Audio of the revision being diffed against, when viewing a diff.
    pub diff_against_audio_url: Option<String>,
    pub diff_type_mismatch: bool,
    pub show_spectrogram: bool,
    /// Attachment IDs of every revision, oldest first.
    pub attachment_revision_ids: Vec<u64>,
    pub settings: AudioPlayerSettings,
}

/// URL to switch to a revision (or a `base-tip` diff) of the attachment.
///
/// Revisions are 1-based; a `tip` of 0 is the "no diff" label and
/// yields `None`, as does a revision without an ID.
pub fn revision_redirect_url(revision_ids: &[u64], base: usize, tip: usize) -> Option<String> {
    if tip == 0 {
        return None;
    }
    let tip_id = revision_ids.get(tip - 1)?;

    if base == 0 {
        Some(format!("../{}/", tip_id))
    } else {
        let base_id = revision_ids.get(base - 1)?;
        Some(format!("../{}-{}/", base_id, tip_id))
    }
}

/// Coordinates the players of an audio reviewable with its comment blocks.
///
/// A single player is created for the revision under review, plus one for
/// the earlier revision when viewing a diff. Comment blocks are routed to
/// the player of the revision they were made on and queued until that
/// player has loaded.
#[derive(Debug)]
pub struct AudioReviewableController<P: WaveformPlayer> {
    pub reviewable: FileAttachmentReviewable,
    options: AudioReviewableOptions,
    later: Option<AudioPlayerController<P>>,
    earlier: Option<AudioPlayerController<P>>,
    pending: Vec<Uuid>,
}

impl<P: WaveformPlayer> AudioReviewableController<P> {
    pub fn new(reviewable: FileAttachmentReviewable, options: AudioReviewableOptions) -> Self {
        Self {
            reviewable,
            options,
            later: None,
            earlier: None,
            pending: Vec::new(),
        }
    }

    /// Create the players. `make_player` is called once per player, the
    /// earlier revision's first.
    pub fn render_content<F>(&mut self, mut make_player: F) -> Result<(), AudioReviewError>
    where
        F: FnMut() -> P,
    {
        if self.options.diff_type_mismatch {
            return Err(AudioReviewError::DiffTypeMismatch);
        }

        if let Some(url) = self.options.diff_against_audio_url.clone() {
            self.earlier = Some(self.create_player(make_player(), url));
        }
        let url = self.options.audio_url.clone();
        self.later = Some(self.create_player(make_player(), url));
        Ok(())
    }

    fn create_player(&self, player: P, audio_url: String) -> AudioPlayerController<P> {
        let settings = AudioPlayerSettings {
            audio_url,
            ..self.options.settings.clone()
        };
        let mut controller = AudioPlayerController::new(player, settings);
        controller.render();
        controller.set_spectrogram_visible(self.options.show_spectrogram);
        controller
    }

    pub fn player(&self, side: RevisionSide) -> Option<&AudioPlayerController<P>> {
        match side {
            RevisionSide::Earlier => self.earlier.as_ref(),
            RevisionSide::Later => self.later.as_ref(),
        }
    }

    pub fn player_mut(&mut self, side: RevisionSide) -> Option<&mut AudioPlayerController<P>> {
        match side {
            RevisionSide::Earlier => self.earlier.as_mut(),
            RevisionSide::Later => self.later.as_mut(),
        }
    }

    /// Comment blocks waiting for their player to load.
    pub fn pending_blocks(&self) -> &[Uuid] {
        &self.pending
    }

    pub fn show_spectrogram(&self) -> bool {
        self.options.show_spectrogram
    }

    pub fn set_show_spectrogram(&mut self, visible: bool) {
        self.options.show_spectrogram = visible;
        for player in [self.earlier.as_mut(), self.later.as_mut()].into_iter().flatten() {
            player.set_spectrogram_visible(visible);
        }
    }

    /// Show a comment block on its player, or queue it until the player loads.
    pub fn render_comment_block(&mut self, block_id: Uuid) {
        let Some(region) = self.audio_region(block_id) else {
            warn!("No audio comment block {}", block_id);
            return;
        };

        let side = RevisionSide::of(&region);
        let loaded = self.player(side).is_some_and(|p| p.has_loaded());
        if !loaded {
            if !self.pending.contains(&block_id) {
                self.pending.push(block_id);
            }
            return;
        }

        if let Some(player) = self.player_mut(side) {
            player.add_comment(block_id, &region);
        }
    }

    /// Load serialized comments and show each resulting block.
    pub fn load_comments(&mut self, comments: Vec<SerializedComment>) -> Result<usize, FieldError> {
        let mut loaded = 0;
        for (_, batch) in group_audio_comments(comments) {
            if let Some(id) = self.reviewable.add_comment_blocks(batch)? {
                self.render_comment_block(id);
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// A player finished loading; flush the comment blocks queued for it.
    pub fn on_file_loaded(&mut self, side: RevisionSide) -> Vec<AttachmentEvent> {
        let Some(player) = self.player_mut(side) else {
            return Vec::new();
        };
        let events = player.on_file_loaded();

        let (ready, waiting): (Vec<Uuid>, Vec<Uuid>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|id| {
                self.audio_region(*id)
                    .is_some_and(|region| RevisionSide::of(&region) == side)
            });
        self.pending = waiting;
        for id in ready {
            self.render_comment_block(id);
        }

        events
    }

    /// The user drew a region on a player: start a comment block for it.
    pub fn on_region_created(
        &mut self,
        side: RevisionSide,
        region_id: RegionId,
        span: RegionSpan,
    ) -> Vec<AttachmentEvent> {
        let Some(player) = self.player_mut(side) else {
            return Vec::new();
        };
        let mut events = player.on_region_created(region_id, span);
        if events.is_empty() {
            return events;
        }

        let fields = RegionFields::Audio(AudioRegion {
            start: Some(span.start),
            end: Some(span.end),
            attached_to_earlier_revision: side == RevisionSide::Earlier,
        });
        match self.reviewable.create_comment_block(fields) {
            Ok(block_id) => {
                self.render_comment_block(block_id);
                events.push(AttachmentEvent::CommentRegionCreated(block_id));
            }
            Err(e) => error!("Failed to create comment block: {}", e),
        }
        events
    }

    /// Delete a comment block and its region.
    pub fn remove_comment_block(&mut self, block_id: Uuid) -> Vec<AttachmentEvent> {
        let Some(block) = self.reviewable.remove_comment_block(block_id) else {
            return Vec::new();
        };
        self.pending.retain(|id| *id != block_id);

        if let RegionFields::Audio(region) = &block.fields {
            if let Some(player) = self.player_mut(RevisionSide::of(region)) {
                player.remove_comment(block_id);
            }
        }
        vec![AttachmentEvent::CommentRegionRemoved(block_id)]
    }

    /// A revision was picked in the revision selector.
    pub fn on_revision_selected(&self, base: usize, tip: usize) -> Option<AttachmentEvent> {
        revision_redirect_url(&self.options.attachment_revision_ids, base, tip)
            .map(AttachmentEvent::Redirect)
    }

    fn audio_region(&self, block_id: Uuid) -> Option<AudioRegion> {
        match self.reviewable.comment_block(block_id)?.fields {
            RegionFields::Audio(region) => Some(region),
            _ => None,
        }
    }
}
