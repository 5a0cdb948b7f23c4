use std::process::ExitCode;
use std::sync::Arc;

use bridge::{MetricsHandle, RenderDriver, VideoTicker};
use tracing::{error, info};

use super::bootstrap::{AppWiring, DEMO_TAP_AFTER_REDRAWS, DEMO_WINDOW};
use super::host::DemoHost;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring { controller, pump } = app;
    let metrics = MetricsHandle::default();

    controller.on_surface_changed(DEMO_WINDOW.0, DEMO_WINDOW.1);

    let render = match RenderDriver::spawn(Arc::clone(&controller), metrics.clone()) {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    let ticker = match VideoTicker::spawn(Arc::clone(&controller)) {
        Ok(handle) => handle,
        Err(err) => {
            error!(error = %err, "startup_failed");
            render.stop();
            return ExitCode::FAILURE;
        }
    };

    let mut host = DemoHost::new(
        Arc::clone(&controller),
        DEMO_WINDOW,
        Some(DEMO_TAP_AFTER_REDRAWS),
    );
    controller.render_surface_created();

    while !host.is_finished() {
        match pump.recv() {
            Some(request) => pump.dispatch(request, &controller, &mut host),
            None => break,
        }
    }

    controller.on_destroy();
    ticker.stop();
    render.stop();

    let snapshot = metrics.snapshot();
    info!(
        fps = snapshot.fps,
        tps = snapshot.tps,
        frame_time_ms = snapshot.frame_time_ms,
        "player_exit"
    );
    ExitCode::SUCCESS
}
