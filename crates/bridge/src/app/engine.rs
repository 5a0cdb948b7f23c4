use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

/// Every call is made from inside the engine gate, one at a time, so
/// implementations need nothing beyond `Send`.
pub trait NativeEngine: Send {
    fn init_engine(&mut self, base_path: Option<&Path>);

    /// Re-binds the graphics context after the surface was lost, keeping all
    /// other engine state.
    fn reinit_graphics(&mut self);

    /// Releases all engine resources. Called at most once.
    fn cleanup(&mut self);

    /// Runs one frame. `false` means the engine has ended.
    fn advance_frame(&mut self) -> bool;

    fn pause(&mut self);
    fn resume(&mut self);

    fn touch_start(&mut self, x: i32, y: i32, pointer_count: u32);
    fn touch_move(&mut self, x: i32, y: i32);
    fn touch_end(&mut self, x: i32, y: i32, pointer_count: u32);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoRequest {
    Play { name: String, skippable: bool },
    Stop,
}

/// Engine-side handle for driving video playback.
///
/// The engine runs inside the gate, so it cannot start a session directly;
/// requests are queued and serviced once the gate has been released.
#[derive(Debug, Clone)]
pub struct VideoPort {
    requests: Sender<VideoRequest>,
    active: Arc<AtomicBool>,
}

impl VideoPort {
    pub fn channel() -> (Self, VideoRequests) {
        let (sender, receiver) = unbounded();
        let active = Arc::new(AtomicBool::new(false));
        let port = Self {
            requests: sender,
            active: Arc::clone(&active),
        };
        (
            port,
            VideoRequests {
                receiver,
                active,
            },
        )
    }

    pub fn play(&self, name: impl Into<String>, skippable: bool) {
        let name = name.into();
        debug!(name = %name, skippable, "video_play_queued");
        // Reads as playing from the request on, until the session ends or
        // fails to start.
        self.active.store(true, Ordering::Release);
        if self
            .requests
            .send(VideoRequest::Play { name, skippable })
            .is_err()
        {
            self.active.store(false, Ordering::Release);
        }
    }

    pub fn stop(&self) {
        let _ = self.requests.send(VideoRequest::Stop);
    }

    pub fn is_playing(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct VideoRequests {
    receiver: Receiver<VideoRequest>,
    active: Arc<AtomicBool>,
}

impl VideoRequests {
    pub fn try_next(&self) -> Option<VideoRequest> {
        self.receiver.try_recv().ok()
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}
