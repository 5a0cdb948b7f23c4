use std::sync::Arc;

use crossbeam_channel::unbounded;
use tracing::{debug, info};

use super::config::BridgeConfig;
use super::context::{EngineContext, EngineSession, SharedState};
use super::engine::{NativeEngine, VideoRequest, VideoRequests};
use super::input::InputDispatcher;
use super::render_loop::RenderLoop;
use super::ui::UiPump;
use super::video::{release_on_teardown, MediaBackend, VideoController};
use super::viewport::Viewport;
use crate::storage::AssetReader;

pub struct LifecycleController {
    ctx: Arc<EngineContext>,
    input: InputDispatcher,
    video: VideoController,
    render: RenderLoop,
}

impl LifecycleController {
    /// Builds the controller around `engine`. The returned pump is the UI
    /// context's end of the request queue.
    pub fn new(
        engine: Box<dyn NativeEngine>,
        video_requests: VideoRequests,
        assets: Arc<dyn AssetReader>,
        media: Arc<dyn MediaBackend>,
        config: BridgeConfig,
    ) -> (Self, UiPump) {
        let (ui_tx, ui_rx) = unbounded();
        let viewport = Viewport::fit(config.canvas.width, config.canvas.height, config.canvas);
        let state = SharedState::new(engine, viewport);
        let ctx = Arc::new(EngineContext::new(
            state,
            config,
            assets,
            media,
            video_requests,
            ui_tx,
        ));

        let controller = Self {
            input: InputDispatcher::new(Arc::clone(&ctx)),
            video: VideoController::new(Arc::clone(&ctx)),
            render: RenderLoop::new(Arc::clone(&ctx)),
            ctx,
        };
        (controller, UiPump::new(ui_rx))
    }

    pub fn input(&self) -> &InputDispatcher {
        &self.input
    }

    pub fn video(&self) -> &VideoController {
        &self.video
    }

    pub fn render_loop(&self) -> &RenderLoop {
        &self.render
    }

    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    pub fn session(&self) -> EngineSession {
        self.ctx.session()
    }

    pub fn on_pause(&self) {
        let mut state = self.ctx.gate.enter("lifecycle_pause");
        if let Some(engine) = state.live_engine() {
            engine.pause();
            debug!("engine_paused");
        }
    }

    pub fn on_resume(&self) {
        let mut state = self.ctx.gate.enter("lifecycle_resume");
        if let Some(engine) = state.live_engine() {
            engine.resume();
            debug!("engine_resumed");
        }
    }

    /// Tears the engine down. Returns `false` when it had already finished.
    pub fn on_destroy(&self) -> bool {
        let mut state = self.ctx.gate.enter("lifecycle_destroy");
        release_on_teardown(&self.ctx, &mut state);
        let torn_down = state.teardown();
        if torn_down {
            info!("engine_destroyed");
        }
        torn_down
    }

    pub fn on_surface_changed(&self, width: u32, height: u32) -> Viewport {
        let viewport = Viewport::fit(width, height, self.ctx.config.canvas);
        self.ctx.gate.with("surface_changed", |state| {
            state.viewport = viewport;
        });
        debug!(
            width,
            height,
            scale = viewport.scale,
            offset_x = viewport.offset_x,
            offset_y = viewport.offset_y,
            "viewport_changed"
        );
        viewport
    }

    /// Marks the render surface as freshly created; the next tick initializes
    /// the engine or rebinds its graphics.
    pub fn render_surface_created(&self) {
        self.ctx.gate.with("render_surface_created", |state| {
            state.render_surface_fresh = true;
        });
        self.ctx.wake_render();
    }

    /// Runs video requests the engine queued through its port. Must be
    /// called outside the gate.
    pub fn service_video_requests(&self) -> usize {
        let mut serviced = 0;
        while let Some(request) = self.ctx.video_requests.try_next() {
            match request {
                // Failures are logged by the controller and leave the session idle.
                VideoRequest::Play { name, skippable } => {
                    let _ = self.video.play(&name, skippable);
                }
                VideoRequest::Stop => {
                    self.video.stop();
                }
            }
            serviced += 1;
        }
        serviced
    }
}
