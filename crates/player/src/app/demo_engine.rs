use std::path::Path;
use std::sync::Arc;

use bridge::{AssetReader, FsByteStore, NativeEngine, VideoPort};
use tracing::{debug, info, warn};

pub(crate) const INTRO_VIDEO: &str = "intro.mp4";
pub(crate) const SAVE_FILE: &str = "sav/global.sav";

/// Scripted stand-in for a native engine: requests the intro video early,
/// treats the skip gesture as "stop the video", and ends after a fixed
/// number of frames. Every run appends one byte to the global save file.
pub(crate) struct DemoEngine {
    port: VideoPort,
    store: Arc<FsByteStore>,
    frame: u64,
    last_frame: u64,
    intro_frame: u64,
    intro_requested: bool,
    runs: usize,
    graphics_binds: u32,
}

impl DemoEngine {
    pub(crate) fn new(port: VideoPort, store: Arc<FsByteStore>, last_frame: u64) -> Self {
        Self {
            port,
            store,
            frame: 0,
            last_frame,
            intro_frame: 2,
            intro_requested: false,
            runs: 0,
            graphics_binds: 0,
        }
    }
}

impl NativeEngine for DemoEngine {
    fn init_engine(&mut self, base_path: Option<&Path>) {
        self.runs = self
            .store
            .read_or_absent(SAVE_FILE)
            .map_or(0, |bytes| bytes.len());
        self.graphics_binds = 1;
        info!(
            base_path = ?base_path,
            previous_runs = self.runs,
            "demo_engine_init"
        );
    }

    fn reinit_graphics(&mut self) {
        self.graphics_binds += 1;
        debug!(binds = self.graphics_binds, "demo_engine_graphics_rebound");
    }

    fn cleanup(&mut self) {
        let result = self.store.open_for_append(SAVE_FILE).and_then(|mut stream| {
            stream.write_byte(1)?;
            stream.close()
        });
        match result {
            Ok(()) => info!(frames = self.frame, "demo_engine_cleanup"),
            Err(error) => warn!(error = %error, "demo_engine_save_failed"),
        }
    }

    fn advance_frame(&mut self) -> bool {
        self.frame += 1;
        if !self.intro_requested && self.frame >= self.intro_frame {
            self.intro_requested = true;
            self.port.play(INTRO_VIDEO, true);
        }
        self.frame < self.last_frame
    }

    fn pause(&mut self) {
        debug!(frame = self.frame, "demo_engine_paused");
    }

    fn resume(&mut self) {
        debug!(frame = self.frame, "demo_engine_resumed");
    }

    fn touch_start(&mut self, x: i32, y: i32, pointer_count: u32) {
        debug!(x, y, pointer_count, "demo_touch_start");
    }

    fn touch_move(&mut self, x: i32, y: i32) {
        debug!(x, y, "demo_touch_move");
    }

    fn touch_end(&mut self, x: i32, y: i32, pointer_count: u32) {
        debug!(x, y, pointer_count, "demo_touch_end");
        if self.port.is_playing() {
            info!("demo_intro_skipped");
            self.port.stop();
        }
    }
}
