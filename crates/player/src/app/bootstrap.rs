use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bridge::{
    load_config, resolve_storage_paths, BridgeConfig, ConfigError, LifecycleController, UiPump,
    VideoPort, CONFIG_ENV_VAR,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::demo_engine::DemoEngine;
use super::demo_media::ClockMedia;

const DEMO_LAST_FRAME: u64 = 240;
const DEMO_VIDEO_DURATION: Duration = Duration::from_millis(1_500);
pub(crate) const DEMO_WINDOW: (u32, u32) = (1920, 1080);
pub(crate) const DEMO_TAP_AFTER_REDRAWS: u32 = 20;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] bridge::StartupError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub(crate) struct AppWiring {
    pub(crate) controller: Arc<LifecycleController>,
    pub(crate) pump: UiPump,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Player Startup ===");

    let config = config_from_env()?;
    let paths = resolve_storage_paths()?;
    info!(
        assets = %paths.asset_dir.display(),
        saves = %paths.save_dir.display(),
        "storage_resolved"
    );
    let store = Arc::new(paths.open_store(&config));

    let (video_port, video_requests) = VideoPort::channel();
    let engine = DemoEngine::new(video_port, Arc::clone(&store), DEMO_LAST_FRAME);
    let (controller, pump) = LifecycleController::new(
        Box::new(engine),
        video_requests,
        store,
        Arc::new(ClockMedia::new(DEMO_VIDEO_DURATION)),
        config,
    );

    Ok(AppWiring {
        controller: Arc::new(controller),
        pump,
    })
}

fn config_from_env() -> Result<BridgeConfig, ConfigError> {
    match env::var_os(CONFIG_ENV_VAR) {
        Some(path) => {
            let path = PathBuf::from(path);
            info!(path = %path.display(), "config_loaded");
            load_config(&path)
        }
        None => Ok(BridgeConfig::default()),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
