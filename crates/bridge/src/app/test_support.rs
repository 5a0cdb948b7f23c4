use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::config::BridgeConfig;
use super::context::{DisplayTarget, EngineContext};
use super::engine::{NativeEngine, VideoPort};
use super::lifecycle::LifecycleController;
use super::ui::{HostSurfaces, UiPump, UiRequest};
use super::video::{MediaBackend, MediaSource, MediaSourceError, PlaybackHandle};
use crate::storage::{AssetReadError, AssetReader};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Init(Option<PathBuf>),
    ReinitGraphics,
    Cleanup,
    Advance,
    Pause,
    Resume,
    TouchStart(i32, i32, u32),
    TouchMove(i32, i32),
    TouchEnd(i32, i32, u32),
}

impl EngineCall {
    pub(crate) fn is_touch(&self) -> bool {
        matches!(
            self,
            Self::TouchStart(..) | Self::TouchMove(..) | Self::TouchEnd(..)
        )
    }
}

#[derive(Debug, Default)]
struct SpyLog {
    calls: Vec<EngineCall>,
    end_next_frame: bool,
}

/// Records every engine call; clones share one log.
#[derive(Debug, Clone, Default)]
pub(crate) struct SpyEngine {
    log: Arc<Mutex<SpyLog>>,
}

impl SpyEngine {
    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        lock(&self.log).calls.clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.log)
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    pub(crate) fn clear(&self) {
        lock(&self.log).calls.clear();
    }

    /// The next `advance_frame` reports that the engine has ended.
    pub(crate) fn end_next_frame(&self) {
        lock(&self.log).end_next_frame = true;
    }

    fn record(&self, call: EngineCall) {
        lock(&self.log).calls.push(call);
    }
}

impl NativeEngine for SpyEngine {
    fn init_engine(&mut self, base_path: Option<&Path>) {
        self.record(EngineCall::Init(base_path.map(Path::to_path_buf)));
    }

    fn reinit_graphics(&mut self) {
        self.record(EngineCall::ReinitGraphics);
    }

    fn cleanup(&mut self) {
        self.record(EngineCall::Cleanup);
    }

    fn advance_frame(&mut self) -> bool {
        let mut log = lock(&self.log);
        log.calls.push(EngineCall::Advance);
        !std::mem::take(&mut log.end_next_frame)
    }

    fn pause(&mut self) {
        self.record(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.record(EngineCall::Resume);
    }

    fn touch_start(&mut self, x: i32, y: i32, pointer_count: u32) {
        self.record(EngineCall::TouchStart(x, y, pointer_count));
    }

    fn touch_move(&mut self, x: i32, y: i32) {
        self.record(EngineCall::TouchMove(x, y));
    }

    fn touch_end(&mut self, x: i32, y: i32, pointer_count: u32) {
        self.record(EngineCall::TouchEnd(x, y, pointer_count));
    }
}

/// Observable state of one fake player.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PlayerScript {
    pub started: bool,
    pub stopped: bool,
    pub released: bool,
    pub playing: bool,
    pub position_ms: u64,
}

type PrepareHook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct FakeMediaState {
    scripts: HashMap<String, PlayerScript>,
    started: Vec<String>,
    failing: HashSet<String>,
    on_prepare: Option<PrepareHook>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeMedia {
    state: Arc<Mutex<FakeMediaState>>,
}

impl FakeMedia {
    pub(crate) fn script(&self, name: &str) -> PlayerScript {
        lock(&self.state)
            .scripts
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn update(&self, name: &str, f: impl FnOnce(&mut PlayerScript)) {
        let mut state = lock(&self.state);
        f(state.scripts.entry(name.to_string()).or_default());
    }

    pub(crate) fn advance(&self, name: &str, ms: u64) {
        self.update(name, |script| script.position_ms += ms);
    }

    /// Playback runs out: the player stops reporting "playing" at a
    /// non-zero position.
    pub(crate) fn finish(&self, name: &str) {
        self.update(name, |script| {
            script.playing = false;
            script.position_ms = script.position_ms.max(1);
        });
    }

    pub(crate) fn started(&self) -> Vec<String> {
        lock(&self.state).started.clone()
    }

    pub(crate) fn fail_prepare(&self, name: &str) {
        lock(&self.state).failing.insert(name.to_string());
    }

    /// Runs `hook` in the middle of every preparation.
    pub(crate) fn on_prepare(&self, hook: impl Fn() + Send + Sync + 'static) {
        lock(&self.state).on_prepare = Some(Arc::new(hook));
    }
}

impl MediaBackend for FakeMedia {
    fn prepare(&self, source: MediaSource) -> Result<Box<dyn PlaybackHandle>, MediaSourceError> {
        let hook = {
            let mut state = lock(&self.state);
            if state.failing.contains(&source.name) {
                return Err(MediaSourceError::Prepare {
                    name: source.name,
                    message: "unsupported codec".to_string(),
                });
            }
            state
                .scripts
                .insert(source.name.clone(), PlayerScript::default());
            state.on_prepare.clone()
        };
        if let Some(hook) = hook {
            hook();
        }
        Ok(Box::new(FakePlayer {
            name: source.name,
            media: self.clone(),
        }))
    }
}

struct FakePlayer {
    name: String,
    media: FakeMedia,
}

impl PlaybackHandle for FakePlayer {
    fn start(&mut self) {
        let mut state = lock(&self.media.state);
        state.started.push(self.name.clone());
        let script = state.scripts.entry(self.name.clone()).or_default();
        script.started = true;
        script.playing = true;
    }

    fn position_ms(&self) -> u64 {
        self.media.script(&self.name).position_ms
    }

    fn is_playing(&self) -> bool {
        self.media.script(&self.name).playing
    }

    fn stop(&mut self) {
        self.media.update(&self.name, |script| {
            script.stopped = true;
            script.playing = false;
        });
    }

    fn release(&mut self) {
        self.media.update(&self.name, |script| script.released = true);
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryAssets {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryAssets {
    pub(crate) fn insert(&self, path: &str, bytes: &[u8]) {
        lock(&self.files).insert(path.to_string(), bytes.to_vec());
    }
}

impl AssetReader for MemoryAssets {
    fn exists(&self, path: &str) -> bool {
        lock(&self.files).contains_key(path)
    }

    fn read_all(&self, path: &str) -> Result<Vec<u8>, AssetReadError> {
        lock(&self.files)
            .get(path)
            .cloned()
            .ok_or_else(|| AssetReadError::NotFound {
                path: PathBuf::from(path),
            })
    }
}

pub(crate) struct Fixture {
    pub controller: Arc<LifecycleController>,
    pub pump: UiPump,
    pub engine: SpyEngine,
    pub media: FakeMedia,
    pub assets: MemoryAssets,
    pub video_port: VideoPort,
}

impl Fixture {
    pub(crate) fn new() -> Self {
        let engine = SpyEngine::default();
        let media = FakeMedia::default();
        let assets = MemoryAssets::default();
        let (video_port, video_requests) = VideoPort::channel();
        let (controller, pump) = LifecycleController::new(
            Box::new(engine.clone()),
            video_requests,
            Arc::new(assets.clone()),
            Arc::new(media.clone()),
            BridgeConfig::default(),
        );
        Self {
            controller: Arc::new(controller),
            pump,
            engine,
            media,
            assets,
            video_port,
        }
    }

    /// A fixture whose engine has gone through its first full init.
    pub(crate) fn loaded() -> Self {
        let fixture = Self::new();
        fixture.controller.render_surface_created();
        fixture.controller.render_loop().tick();
        assert!(fixture.ctx().session().loaded);
        fixture
    }

    pub(crate) fn ctx(&self) -> &EngineContext {
        self.controller.context()
    }

    pub(crate) fn add_video(&self, name: &str) {
        let path = self.ctx().config().media_path(name);
        self.assets.insert(&path, b"\x00\x00\x00\x18ftypmp42");
    }

    /// Drains every request queued for the UI context so far.
    pub(crate) fn ui_requests(&self) -> Vec<UiRequest> {
        std::iter::from_fn(|| self.pump.try_recv()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HostCall {
    Show(DisplayTarget),
    InvalidateVideo,
    Finish,
}

#[derive(Debug, Default)]
pub(crate) struct RecordingHost {
    pub calls: Vec<HostCall>,
}

impl HostSurfaces for RecordingHost {
    fn show_display(&mut self, target: DisplayTarget) {
        self.calls.push(HostCall::Show(target));
    }

    fn invalidate_video(&mut self) {
        self.calls.push(HostCall::InvalidateVideo);
    }

    fn finish(&mut self) {
        self.calls.push(HostCall::Finish);
    }
}
