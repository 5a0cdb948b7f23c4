use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{select, Receiver};
use tracing::{debug, info};

use super::context::{DriveMode, EngineContext, SharedState};
use super::lifecycle::LifecycleController;
use super::metrics::{MetricsHandle, TickAccumulator};
use super::video::poll_liveness_locked;
use super::worker::{spawn_worker, BridgeError, WorkerHandle};

pub const RENDER_THREAD_NAME: &str = "render";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session has finished; nothing is called any more.
    Inert,
    /// A video owns the screen, the render surface sits this tick out.
    VideoOwnsScreen,
    /// No video is published, the video surface has nothing to draw.
    NoVideo,
    NotLoaded,
    EngineInitialized,
    GraphicsReinitialized,
    Advanced,
    /// The engine reported its last frame and has been cleaned up.
    Finished,
}

/// Per-tick driver of the render surface, and the draw callback of the video
/// surface while a video owns the screen.
pub struct RenderLoop {
    ctx: Arc<EngineContext>,
}

impl RenderLoop {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    pub fn tick(&self) -> TickOutcome {
        let outcome = {
            let mut state = self.ctx.gate.enter("render_tick");
            tick_locked(&self.ctx, &mut state)
        };
        self.after_tick(outcome)
    }

    /// Draw callback of the video surface: checks the session is still alive
    /// and advances the engine by one frame.
    pub fn draw_video_frame(&self) -> TickOutcome {
        let outcome = {
            let mut state = self.ctx.gate.enter("video_draw");
            video_frame_locked(&self.ctx, &mut state)
        };
        self.after_tick(outcome)
    }

    fn after_tick(&self, outcome: TickOutcome) -> TickOutcome {
        if outcome == TickOutcome::Finished {
            self.ctx.request_termination();
        }
        outcome
    }
}

fn tick_locked(ctx: &EngineContext, state: &mut SharedState) -> TickOutcome {
    if state.session.finished {
        return TickOutcome::Inert;
    }
    if state.video.is_active() {
        return TickOutcome::VideoOwnsScreen;
    }

    if state.render_surface_fresh {
        state.render_surface_fresh = false;
        let resuming = std::mem::take(&mut state.resume_from_video);
        if !state.session.loaded {
            let base_path = ctx.config.base_path.as_deref();
            if let Some(engine) = state.live_engine() {
                engine.init_engine(base_path);
            }
            state.session.loaded = true;
            info!("engine_initialized");
            return TickOutcome::EngineInitialized;
        }
        // A loaded engine is never initialized twice, whether the surface
        // comes back from video or was recreated: only graphics are rebound.
        if let Some(engine) = state.live_engine() {
            engine.reinit_graphics();
        }
        debug!(resuming, "graphics_reinitialized");
        return TickOutcome::GraphicsReinitialized;
    }

    if !state.session.loaded {
        return TickOutcome::NotLoaded;
    }
    advance_locked(state)
}

fn video_frame_locked(ctx: &EngineContext, state: &mut SharedState) -> TickOutcome {
    if !state.video.is_active() {
        return TickOutcome::NoVideo;
    }
    if state.session.finished {
        return TickOutcome::Inert;
    }
    if !state.session.loaded {
        return TickOutcome::NotLoaded;
    }
    // The engine still runs this frame when playback has just ended; the
    // render surface takes over from the next tick on.
    poll_liveness_locked(ctx, state);
    advance_locked(state)
}

fn advance_locked(state: &mut SharedState) -> TickOutcome {
    let more = match state.live_engine() {
        Some(engine) => engine.advance_frame(),
        None => return TickOutcome::Inert,
    };
    if more {
        return TickOutcome::Advanced;
    }
    state.teardown();
    info!("engine_finished");
    TickOutcome::Finished
}

/// Runs the render loop on its own thread, continuously or on demand
/// according to the current drive mode.
pub struct RenderDriver;

impl RenderDriver {
    pub fn spawn(
        controller: Arc<LifecycleController>,
        metrics: MetricsHandle,
    ) -> Result<WorkerHandle, BridgeError> {
        let wake = controller.context().render_wake_receiver();
        spawn_worker(RENDER_THREAD_NAME, move |stop| {
            run_render_driver(&controller, &stop, &wake, &metrics)
        })
    }
}

fn run_render_driver(
    controller: &LifecycleController,
    stop: &Receiver<()>,
    wake: &Receiver<()>,
    metrics: &MetricsHandle,
) {
    let ctx = controller.context();
    let frame_interval = ctx.config.frame_interval();
    let mut accumulator = TickAccumulator::new(ctx.config.metrics_log_interval(), Instant::now());
    info!(
        frame_interval_ms = frame_interval.as_millis() as u64,
        "render_driver_started"
    );

    loop {
        let proceed = match ctx.drive_mode() {
            DriveMode::Continuous => select! {
                recv(stop) -> _ => false,
                default(frame_interval) => true,
            },
            DriveMode::OnDemand => select! {
                recv(stop) -> _ => false,
                recv(wake) -> _ => true,
            },
        };
        if !proceed {
            break;
        }

        let started = Instant::now();
        let outcome = controller.render_loop().tick();
        let now = Instant::now();
        accumulator.record(outcome, now.saturating_duration_since(started));

        controller.service_video_requests();

        if let Some(snapshot) = accumulator.maybe_snapshot(now) {
            metrics.publish(snapshot);
            info!(
                fps = snapshot.fps,
                tps = snapshot.tps,
                frame_time_ms = snapshot.frame_time_ms,
                skipped_for_video = snapshot.skipped_for_video,
                "loop_metrics"
            );
        }
    }

    info!("render_driver_stopped");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::app::test_support::{EngineCall, Fixture, HostCall, RecordingHost};
    use crate::app::{DisplayTarget, UiRequest};

    #[test]
    fn first_activation_initializes_engine_once() {
        let fixture = Fixture::new();
        assert_eq!(fixture.controller.render_loop().tick(), TickOutcome::NotLoaded);

        fixture.controller.render_surface_created();
        assert_eq!(
            fixture.controller.render_loop().tick(),
            TickOutcome::EngineInitialized
        );
        assert_eq!(fixture.controller.render_loop().tick(), TickOutcome::Advanced);

        assert_eq!(
            fixture.engine.calls(),
            vec![EngineCall::Init(None), EngineCall::Advance]
        );
        assert!(fixture.ctx().session().loaded);
    }

    #[test]
    fn video_owns_screen_while_published() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        fixture.controller.video().play("intro.mp4", false).expect("play");
        let before = fixture.engine.calls().len();

        assert_eq!(
            fixture.controller.render_loop().tick(),
            TickOutcome::VideoOwnsScreen
        );
        assert_eq!(fixture.engine.calls().len(), before);
    }

    #[test]
    fn first_tick_after_video_end_rebinds_graphics_then_advances() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        fixture.controller.video().play("intro.mp4", true).expect("play");
        fixture.media.finish("intro.mp4");
        assert!(!fixture.controller.video().poll_liveness());
        fixture.engine.clear();

        let render = fixture.controller.render_loop();
        assert_eq!(render.tick(), TickOutcome::GraphicsReinitialized);
        assert_eq!(render.tick(), TickOutcome::Advanced);
        assert_eq!(
            fixture.engine.calls(),
            vec![EngineCall::ReinitGraphics, EngineCall::Advance]
        );
    }

    #[test]
    fn stopped_video_also_rebinds_before_the_next_frame() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        fixture.controller.video().play("intro.mp4", true).expect("play");
        assert!(fixture.controller.video().stop());
        fixture.engine.clear();

        let render = fixture.controller.render_loop();
        assert_eq!(render.tick(), TickOutcome::GraphicsReinitialized);
        assert_eq!(render.tick(), TickOutcome::Advanced);
        assert_eq!(
            fixture.engine.calls(),
            vec![EngineCall::ReinitGraphics, EngineCall::Advance]
        );
    }

    #[test]
    fn last_frame_tears_down_and_terminates_once() {
        let fixture = Fixture::loaded();
        fixture.engine.end_next_frame();

        assert_eq!(fixture.controller.render_loop().tick(), TickOutcome::Finished);
        assert!(fixture.ctx().session().finished);
        assert!(fixture.ctx().termination_requested());
        assert_eq!(fixture.ui_requests(), vec![UiRequest::Finish]);

        fixture.engine.clear();
        for _ in 0..3 {
            assert_eq!(fixture.controller.render_loop().tick(), TickOutcome::Inert);
        }
        fixture.controller.on_destroy();
        assert!(fixture.engine.calls().is_empty());
        assert!(fixture.ui_requests().is_empty());
    }

    #[test]
    fn video_surface_advances_engine_while_video_plays() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::NoVideo
        );

        fixture.controller.video().play("intro.mp4", true).expect("play");
        fixture.engine.clear();

        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::Advanced
        );
        fixture.media.finish("intro.mp4");
        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::Advanced
        );
        assert_eq!(
            fixture.engine.calls(),
            vec![EngineCall::Advance, EngineCall::Advance]
        );
        assert_eq!(fixture.ctx().display_target(), DisplayTarget::Render);
        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::NoVideo
        );
    }

    #[test]
    fn video_surface_can_end_the_engine() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        fixture.controller.video().play("intro.mp4", true).expect("play");
        fixture.engine.end_next_frame();

        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::Finished
        );
        assert!(fixture.ctx().termination_requested());
        assert_eq!(
            fixture.controller.render_loop().draw_video_frame(),
            TickOutcome::Inert
        );
    }

    #[test]
    fn driver_thread_ticks_and_stops() {
        let fixture = Fixture::new();
        fixture.controller.render_surface_created();
        let metrics = MetricsHandle::default();

        let handle = RenderDriver::spawn(Arc::clone(&fixture.controller), metrics)
            .expect("spawn render driver");
        let deadline = Instant::now() + Duration::from_secs(5);
        while fixture.engine.count(|call| *call == EngineCall::Advance) < 3 {
            assert!(Instant::now() < deadline, "render driver made no progress");
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();

        let calls = fixture.engine.calls();
        assert_eq!(calls.first(), Some(&EngineCall::Init(None)));
        let after_stop = calls.len();
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(fixture.engine.calls().len(), after_stop);
    }

    #[test]
    fn driver_rebinds_graphics_before_any_frame_after_video_ends() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        let handle = RenderDriver::spawn(Arc::clone(&fixture.controller), MetricsHandle::default())
            .expect("spawn render driver");

        fixture.controller.video().play("intro.mp4", true).expect("play");
        // Published under the gate: the driver cannot advance from here on.
        fixture.engine.clear();
        assert_eq!(
            fixture.pump.recv(),
            Some(UiRequest::ShowDisplay(DisplayTarget::Video))
        );

        fixture.media.finish("intro.mp4");
        assert!(!fixture.controller.video().poll_liveness());

        let deadline = Instant::now() + Duration::from_secs(5);
        while fixture.engine.calls().len() < 2 {
            assert!(Instant::now() < deadline, "render driver never resumed");
            std::thread::sleep(Duration::from_millis(2));
        }
        // The UI context applies the display switch only now, after the
        // driver has already resumed.
        let mut host = RecordingHost::default();
        assert_eq!(
            fixture.pump.recv(),
            Some(UiRequest::ShowDisplay(DisplayTarget::Render))
        );
        fixture.pump.dispatch(
            UiRequest::ShowDisplay(DisplayTarget::Render),
            &fixture.controller,
            &mut host,
        );
        let after_switch = fixture.engine.calls().len();
        while fixture.engine.calls().len() < after_switch + 2 {
            assert!(Instant::now() < deadline, "render driver stalled");
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();

        let calls = fixture.engine.calls();
        assert_eq!(calls[0], EngineCall::ReinitGraphics);
        assert!(calls[1..].iter().all(|call| *call == EngineCall::Advance));
        assert_eq!(host.calls, vec![HostCall::Show(DisplayTarget::Render)]);
    }

    #[test]
    fn driver_services_engine_video_requests() {
        let fixture = Fixture::loaded();
        fixture.add_video("intro.mp4");
        fixture.video_port.play("intro.mp4", true);

        let handle = RenderDriver::spawn(Arc::clone(&fixture.controller), MetricsHandle::default())
            .expect("spawn render driver");
        let deadline = Instant::now() + Duration::from_secs(5);
        while !fixture.ctx().is_video_active() {
            assert!(Instant::now() < deadline, "video request was never serviced");
            std::thread::sleep(Duration::from_millis(2));
        }
        handle.stop();

        assert_eq!(fixture.ctx().drive_mode(), DriveMode::OnDemand);
    }
}
