use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod storage;

pub use app::{
    load_config, measure_video_surface, parse_config, BridgeConfig, BridgeError, ConfigError,
    DisplayTarget, DriveMode, EngineContext, EngineSession, HostSurfaces, InputDispatcher,
    LifecycleController, LogicalCanvas, LoopMetricsSnapshot, MediaBackend, MediaSource,
    MediaSourceError, MetricsHandle, NativeEngine, PlaybackHandle, PointerAction, PointerEvent,
    RenderDriver, RenderLoop, TickOutcome, TouchState, UiPump, UiRequest, VideoController,
    VideoPhase, VideoPort, VideoRequest, VideoRequests, VideoTicker, Viewport, WorkerHandle,
    CONFIG_ENV_VAR, LOGICAL_HEIGHT, LOGICAL_WIDTH,
};
pub use storage::{AssetReadError, AssetReader, FsByteStore, SaveStream, SaveWriteError};

pub const ROOT_ENV_VAR: &str = "XENGINE_ROOT";

#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub root: PathBuf,
    /// Read-only bundle assets, videos included.
    pub asset_dir: PathBuf,
    /// Writable per-user save directory.
    pub save_dir: PathBuf,
}

impl StoragePaths {
    /// Lays out the asset and save directories under `root`, creating the
    /// save directory if needed.
    pub fn under(root: &Path) -> Result<Self, StartupError> {
        let asset_dir = root.join("assets");
        let save_dir = root.join("save");
        fs::create_dir_all(&save_dir).map_err(|source| StartupError::CreateSaveDir {
            path: save_dir.clone(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            asset_dir,
            save_dir,
        })
    }

    pub fn open_store(&self, config: &BridgeConfig) -> FsByteStore {
        FsByteStore::new(&self.asset_dir, &self.save_dir)
            .with_save_prefix(config.save_prefix.clone())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error("failed to create save directory at {path}: {source}")]
    CreateSaveDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("XENGINE_ROOT is set but does not point to a directory with an assets/ folder: {path}")]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not find an assets/ directory walking upward from {start_dir}\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/player\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_storage_paths() -> Result<StoragePaths, StartupError> {
    let root = resolve_root()?;
    StoragePaths::under(&root)
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_asset_root(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_asset_root(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_asset_root(path: &Path) -> bool {
    path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
