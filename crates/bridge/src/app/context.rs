use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};

use super::config::BridgeConfig;
use super::engine::{NativeEngine, VideoRequests};
use super::gate::EngineGate;
use super::input::TouchState;
use super::ui::UiRequest;
use super::video::{MediaBackend, VideoPhase, VideoSession};
use super::viewport::Viewport;
use crate::storage::AssetReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayTarget {
    Render,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    Continuous,
    OnDemand,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineSession {
    /// Set by the first full engine initialization; never reset.
    pub loaded: bool,
    /// Set exactly once; afterwards the engine is never called again.
    pub finished: bool,
}

pub(crate) struct SharedState {
    engine: Box<dyn NativeEngine>,
    pub(crate) session: EngineSession,
    pub(crate) viewport: Viewport,
    pub(crate) touch: TouchState,
    pub(crate) video: VideoSession,
    pub(crate) display: DisplayTarget,
    pub(crate) drive_mode: DriveMode,
    /// One-shot: the next render surface activation only rebinds graphics.
    pub(crate) resume_from_video: bool,
    pub(crate) render_surface_fresh: bool,
}

impl SharedState {
    pub(crate) fn new(engine: Box<dyn NativeEngine>, viewport: Viewport) -> Self {
        Self {
            engine,
            session: EngineSession::default(),
            viewport,
            touch: TouchState::default(),
            video: VideoSession::default(),
            display: DisplayTarget::Render,
            drive_mode: DriveMode::Continuous,
            resume_from_video: false,
            render_surface_fresh: false,
        }
    }

    pub(crate) fn live_engine(&mut self) -> Option<&mut dyn NativeEngine> {
        if self.session.finished {
            None
        } else {
            Some(self.engine.as_mut())
        }
    }

    /// Runs engine cleanup and marks the session finished. Returns `false`
    /// if the session had already finished.
    pub(crate) fn teardown(&mut self) -> bool {
        if self.session.finished {
            return false;
        }
        self.engine.cleanup();
        self.session.finished = true;
        true
    }
}

pub struct EngineContext {
    pub(crate) gate: EngineGate<SharedState>,
    pub(crate) config: BridgeConfig,
    pub(crate) assets: Arc<dyn AssetReader>,
    pub(crate) media: Arc<dyn MediaBackend>,
    pub(crate) video_requests: VideoRequests,
    ui: Sender<UiRequest>,
    render_wake: (Sender<()>, Receiver<()>),
    termination_requested: AtomicBool,
}

impl EngineContext {
    pub(crate) fn new(
        state: SharedState,
        config: BridgeConfig,
        assets: Arc<dyn AssetReader>,
        media: Arc<dyn MediaBackend>,
        video_requests: VideoRequests,
        ui: Sender<UiRequest>,
    ) -> Self {
        Self {
            gate: EngineGate::new(state),
            config,
            assets,
            media,
            video_requests,
            ui,
            render_wake: bounded(1),
            termination_requested: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn session(&self) -> EngineSession {
        self.gate.with("session", |state| state.session)
    }

    pub fn is_video_active(&self) -> bool {
        self.gate.with("video_active", |state| state.video.is_active())
    }

    pub fn video_phase(&self) -> VideoPhase {
        self.gate.with("video_phase", |state| state.video.phase())
    }

    pub fn drive_mode(&self) -> DriveMode {
        self.gate.with("drive_mode", |state| state.drive_mode)
    }

    pub fn display_target(&self) -> DisplayTarget {
        self.gate.with("display_target", |state| state.display)
    }

    pub fn viewport(&self) -> Viewport {
        self.gate.with("viewport", |state| state.viewport)
    }

    pub fn touch_state(&self) -> TouchState {
        self.gate.with("touch_state", |state| state.touch)
    }

    pub fn termination_requested(&self) -> bool {
        self.termination_requested.load(Ordering::Acquire)
    }

    pub(crate) fn post_ui(&self, request: UiRequest) {
        if self.ui.send(request).is_err() {
            debug!(?request, "ui_request_dropped");
        }
    }

    pub(crate) fn wake_render(&self) {
        // A full slot already guarantees a pending wake-up.
        let _ = self.render_wake.0.try_send(());
    }

    pub(crate) fn render_wake_receiver(&self) -> Receiver<()> {
        self.render_wake.1.clone()
    }

    /// Asks the host to close the window. Only the first call has an effect.
    pub(crate) fn request_termination(&self) -> bool {
        if self
            .termination_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            info!("termination_requested");
            self.post_ui(UiRequest::Finish);
            true
        } else {
            false
        }
    }

    /// Must be called inside the gate. The render surface counts as
    /// re-activated from here on, however late the UI context applies the
    /// display switch.
    pub(crate) fn restore_render_surface(&self, state: &mut SharedState) {
        state.display = DisplayTarget::Render;
        state.drive_mode = DriveMode::Continuous;
        state.render_surface_fresh = true;
        self.post_ui(UiRequest::ShowDisplay(DisplayTarget::Render));
        self.wake_render();
    }
}
