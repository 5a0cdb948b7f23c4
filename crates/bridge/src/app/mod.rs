mod config;
mod context;
mod engine;
mod gate;
mod input;
mod lifecycle;
mod metrics;
mod render_loop;
#[cfg(test)]
mod test_support;
mod ticker;
mod ui;
mod video;
mod viewport;
mod worker;

pub use config::{load_config, parse_config, BridgeConfig, ConfigError, CONFIG_ENV_VAR};
pub use context::{DisplayTarget, DriveMode, EngineContext, EngineSession};
pub use engine::{NativeEngine, VideoPort, VideoRequest, VideoRequests};
pub use gate::{EngineGate, GateGuard};
pub use input::{InputDispatcher, PointerAction, PointerEvent, TouchState};
pub use lifecycle::LifecycleController;
pub use metrics::{LoopMetricsSnapshot, MetricsHandle};
pub use render_loop::{RenderDriver, RenderLoop, TickOutcome, RENDER_THREAD_NAME};
pub use ticker::{VideoTicker, VIDEO_TICKER_THREAD_NAME};
pub use ui::{HostSurfaces, UiPump, UiRequest};
pub use video::{
    MediaBackend, MediaSource, MediaSourceError, PlaybackHandle, VideoController, VideoPhase,
};
pub use viewport::{
    measure_video_surface, LogicalCanvas, Viewport, LOGICAL_HEIGHT, LOGICAL_WIDTH,
};
pub use worker::{BridgeError, WorkerHandle};
