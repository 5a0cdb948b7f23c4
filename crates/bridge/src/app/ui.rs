use crossbeam_channel::Receiver;
use tracing::debug;

use super::context::DisplayTarget;
use super::lifecycle::LifecycleController;

/// Work that must run on the UI-owning context because it touches surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    ShowDisplay(DisplayTarget),
    RedrawVideo,
    /// Close the hosting window; sent at most once.
    Finish,
}

/// Platform surfaces, only ever touched from the UI context.
pub trait HostSurfaces {
    fn show_display(&mut self, target: DisplayTarget);

    /// Schedules a redraw of the video surface. The redraw itself is expected
    /// to call [`crate::RenderLoop::draw_video_frame`].
    fn invalidate_video(&mut self);

    fn finish(&mut self);
}

/// UI-context end of the cross-context request queue.
pub struct UiPump {
    receiver: Receiver<UiRequest>,
}

impl UiPump {
    pub(crate) fn new(receiver: Receiver<UiRequest>) -> Self {
        Self { receiver }
    }

    /// Blocks until the next request arrives.
    pub fn recv(&self) -> Option<UiRequest> {
        self.receiver.recv().ok()
    }

    pub fn try_recv(&self) -> Option<UiRequest> {
        self.receiver.try_recv().ok()
    }

    /// Dispatches every request already queued; returns how many ran.
    pub fn drain(&self, controller: &LifecycleController, host: &mut impl HostSurfaces) -> usize {
        let mut handled = 0;
        while let Some(request) = self.try_recv() {
            self.dispatch(request, controller, host);
            handled += 1;
        }
        handled
    }

    pub fn dispatch(
        &self,
        request: UiRequest,
        controller: &LifecycleController,
        host: &mut impl HostSurfaces,
    ) {
        match request {
            UiRequest::ShowDisplay(target) => {
                debug!(?target, "display_switch");
                host.show_display(target);
            }
            UiRequest::RedrawVideo => {
                if controller.context().is_video_active() {
                    host.invalidate_video();
                }
                // The render driver sleeps while a video owns the screen, so
                // requests the engine queued during the redraw run here.
                controller.service_video_requests();
            }
            UiRequest::Finish => host.finish(),
        }
    }
}
