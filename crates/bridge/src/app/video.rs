use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::context::{DisplayTarget, DriveMode, EngineContext, SharedState};
use super::ui::UiRequest;
use crate::storage::AssetReader;
use crate::AssetReadError;

pub trait PlaybackHandle: Send {
    fn start(&mut self);

    /// Current playback position. Zero until playback has actually advanced.
    fn position_ms(&self) -> u64;

    fn is_playing(&self) -> bool;

    fn stop(&mut self);

    fn release(&mut self);
}

#[derive(Debug, Clone)]
pub struct MediaSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Builds playback handles. `prepare` may block on file and codec I/O and is
/// never called inside the engine gate.
pub trait MediaBackend: Send + Sync {
    fn prepare(&self, source: MediaSource) -> Result<Box<dyn PlaybackHandle>, MediaSourceError>;
}

#[derive(Debug, Error)]
pub enum MediaSourceError {
    #[error("video source {name} is unavailable: {source}")]
    Unavailable {
        name: String,
        #[source]
        source: AssetReadError,
    },
    #[error("failed to prepare video {name}: {message}")]
    Prepare { name: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoPhase {
    Idle,
    Preparing,
    Playing,
}

/// The single video playback slot. An absent handle means no video owns the
/// screen.
pub(crate) struct VideoSession {
    handle: Option<Box<dyn PlaybackHandle>>,
    phase: VideoPhase,
    name: Option<String>,
    skippable: bool,
    /// Bumped by every play or stop so a superseded preparation is discarded.
    generation: u64,
}

impl Default for VideoSession {
    fn default() -> Self {
        Self {
            handle: None,
            phase: VideoPhase::Idle,
            name: None,
            skippable: false,
            generation: 0,
        }
    }
}

impl VideoSession {
    pub(crate) fn is_active(&self) -> bool {
        self.handle.is_some()
    }

    pub(crate) fn phase(&self) -> VideoPhase {
        self.phase
    }

    pub(crate) fn skippable(&self) -> bool {
        self.skippable
    }

    fn begin(&mut self, name: &str, skippable: bool) -> u64 {
        self.release_handle();
        self.generation = self.generation.wrapping_add(1);
        self.phase = VideoPhase::Preparing;
        self.name = Some(name.to_string());
        self.skippable = skippable;
        self.generation
    }

    fn clear(&mut self) {
        self.release_handle();
        self.generation = self.generation.wrapping_add(1);
        self.phase = VideoPhase::Idle;
        self.name = None;
        self.skippable = false;
    }

    fn release_handle(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            handle.stop();
            handle.release();
        }
    }
}

pub struct VideoController {
    ctx: Arc<EngineContext>,
}

impl VideoController {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Starts playing `name`, interrupting any running session.
    ///
    /// The byte source is read and the handle prepared outside the gate; the
    /// session is published afterwards unless a later play or stop request
    /// superseded it in the meantime.
    pub fn play(&self, name: &str, skippable: bool) -> Result<(), MediaSourceError> {
        let generation = {
            let mut state = self.ctx.gate.enter("video_play_begin");
            if state.session.finished {
                debug!(name, "video_play_ignored_after_finish");
                self.ctx.video_requests.set_active(false);
                return Ok(());
            }
            if state.video.is_active() {
                info!(name, "video_interrupted");
            }
            state.video.begin(name, skippable)
        };

        let handle = match self.prepare(name) {
            Ok(handle) => handle,
            Err(error) => {
                warn!(name, error = %error, "video_play_failed");
                self.abandon(generation);
                return Err(error);
            }
        };

        let mut state = self.ctx.gate.enter("video_publish");
        publish(&self.ctx, &mut state, generation, handle);
        Ok(())
    }

    /// Ends the session once playback has run out.
    pub fn poll_liveness(&self) -> bool {
        let mut state = self.ctx.gate.enter("video_poll");
        poll_liveness_locked(&self.ctx, &mut state)
    }

    pub fn stop(&self) -> bool {
        let mut state = self.ctx.gate.enter("video_stop");
        stop_locked(&self.ctx, &mut state, "stopped")
    }

    pub fn phase(&self) -> VideoPhase {
        self.ctx.video_phase()
    }

    fn prepare(&self, name: &str) -> Result<Box<dyn PlaybackHandle>, MediaSourceError> {
        let path = self.ctx.config.media_path(name);
        let bytes = self
            .ctx
            .assets
            .read_all(&path)
            .map_err(|source| MediaSourceError::Unavailable {
                name: name.to_string(),
                source,
            })?;
        self.ctx.media.prepare(MediaSource {
            name: name.to_string(),
            bytes,
        })
    }

    fn abandon(&self, generation: u64) {
        let mut state = self.ctx.gate.enter("video_abandon");
        if state.video.generation != generation {
            return;
        }
        // An interrupted session may have left the video surface on screen.
        if state.display == DisplayTarget::Video {
            stop_locked(&self.ctx, &mut state, "abandoned");
        } else {
            state.video.clear();
            self.ctx.video_requests.set_active(false);
        }
    }
}

fn publish(
    ctx: &EngineContext,
    state: &mut SharedState,
    generation: u64,
    mut handle: Box<dyn PlaybackHandle>,
) {
    if state.video.generation != generation || state.session.finished {
        debug!(generation, "video_preparation_superseded");
        handle.stop();
        handle.release();
        return;
    }

    handle.start();
    state.video.handle = Some(handle);
    state.video.phase = VideoPhase::Playing;
    state.drive_mode = DriveMode::OnDemand;
    if state.display != DisplayTarget::Video {
        state.display = DisplayTarget::Video;
        ctx.post_ui(UiRequest::ShowDisplay(DisplayTarget::Video));
    }
    ctx.video_requests.set_active(true);
    info!(
        name = state.video.name.as_deref().unwrap_or_default(),
        skippable = state.video.skippable,
        "video_started"
    );
}

pub(crate) fn poll_liveness_locked(ctx: &EngineContext, state: &mut SharedState) -> bool {
    let Some(handle) = state.video.handle.as_ref() else {
        return false;
    };
    // Right after start the player can briefly report "not playing".
    if handle.position_ms() == 0 {
        return true;
    }
    if handle.is_playing() {
        return true;
    }
    stop_locked(ctx, state, "completed");
    false
}

/// Ends the session and hands the screen back to the render surface. Must be
/// called inside the gate.
pub(crate) fn stop_locked(
    ctx: &EngineContext,
    state: &mut SharedState,
    reason: &'static str,
) -> bool {
    if state.video.phase == VideoPhase::Idle {
        return false;
    }

    let name = state.video.name.take().unwrap_or_default();
    state.video.clear();
    ctx.video_requests.set_active(false);

    if state.display == DisplayTarget::Video {
        state.resume_from_video = true;
        ctx.restore_render_surface(state);
    }
    info!(name = %name, reason, "video_ended");
    true
}

// Teardown only: the display is left as it is.
pub(crate) fn release_on_teardown(ctx: &EngineContext, state: &mut SharedState) {
    if state.video.phase != VideoPhase::Idle {
        state.video.clear();
        ctx.video_requests.set_active(false);
    }
}
