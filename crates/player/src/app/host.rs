use std::sync::Arc;

use bridge::{
    measure_video_surface, DisplayTarget, HostSurfaces, LifecycleController, PointerAction,
    PointerEvent,
};
use tracing::info;

/// Headless stand-in for the platform window. The video surface "redraw"
/// runs the video draw callback directly, and after a few redraws the host
/// taps the screen to skip the intro.
pub(crate) struct DemoHost {
    controller: Arc<LifecycleController>,
    window: (u32, u32),
    shown: DisplayTarget,
    video_redraws: u32,
    tap_after_redraws: Option<u32>,
    finished: bool,
}

impl DemoHost {
    pub(crate) fn new(
        controller: Arc<LifecycleController>,
        window: (u32, u32),
        tap_after_redraws: Option<u32>,
    ) -> Self {
        Self {
            controller,
            window,
            shown: DisplayTarget::Render,
            video_redraws: 0,
            tap_after_redraws,
            finished: false,
        }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    fn tap_center(&self) {
        let (width, height) = self.window;
        let input = self.controller.input();
        for (action, pointer_count) in [(PointerAction::Down, 1), (PointerAction::Up, 0)] {
            input.handle_event(PointerEvent {
                action,
                x: width as f32 / 2.0,
                y: height as f32 / 2.0,
                pointer_count,
            });
        }
    }
}

impl HostSurfaces for DemoHost {
    fn show_display(&mut self, target: DisplayTarget) {
        if target == DisplayTarget::Video {
            let canvas = self.controller.context().config().canvas;
            let (width, height) = measure_video_surface(self.window.0, self.window.1, canvas);
            info!(width, height, "video_surface_shown");
            self.video_redraws = 0;
        } else {
            info!("render_surface_shown");
        }
        self.shown = target;
    }

    fn invalidate_video(&mut self) {
        if self.shown != DisplayTarget::Video {
            return;
        }
        self.controller.render_loop().draw_video_frame();
        self.video_redraws += 1;
        if self.tap_after_redraws == Some(self.video_redraws) {
            info!(redraws = self.video_redraws, "demo_tap");
            self.tap_center();
        }
    }

    fn finish(&mut self) {
        info!("host_finish");
        self.finished = true;
    }
}
