use std::sync::Arc;

use crossbeam_channel::{select, Receiver};
use tracing::info;

use super::lifecycle::LifecycleController;
use super::ui::UiRequest;
use super::worker::{spawn_worker, BridgeError, WorkerHandle};

pub const VIDEO_TICKER_THREAD_NAME: &str = "video-ticker";

/// Periodically asks the UI context to redraw the video surface while a
/// video owns the screen. It never touches the engine itself.
pub struct VideoTicker;

impl VideoTicker {
    pub fn spawn(controller: Arc<LifecycleController>) -> Result<WorkerHandle, BridgeError> {
        spawn_worker(VIDEO_TICKER_THREAD_NAME, move |stop| {
            run_video_ticker(&controller, &stop)
        })
    }
}

fn run_video_ticker(controller: &LifecycleController, stop: &Receiver<()>) {
    let ctx = controller.context();
    let period = ctx.config.video_tick();
    info!(period_ms = period.as_millis() as u64, "video_ticker_started");

    loop {
        select! {
            recv(stop) -> _ => break,
            default(period) => {
                if ctx.is_video_active() {
                    ctx.post_ui(UiRequest::RedrawVideo);
                }
            }
        }
    }

    info!("video_ticker_stopped");
}
