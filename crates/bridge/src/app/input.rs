use std::sync::Arc;

use tracing::trace;

use super::context::{EngineContext, SharedState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TouchState {
    /// Logical Y of the last pointer-down.
    pub last_y: i32,
    /// Pointer count seen by the previous event.
    pub pointer_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Down,
    Move,
    Up,
    /// Anything else the platform reports (cancel, hover, ...).
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub action: PointerAction,
    pub x: f32,
    pub y: f32,
    pub pointer_count: u32,
}

/// Forwards pointer input to the engine in logical canvas coordinates.
///
/// While a video owns the screen every event becomes the skip gesture.
/// Events are dropped once the session has finished.
pub struct InputDispatcher {
    ctx: Arc<EngineContext>,
}

impl InputDispatcher {
    pub(crate) fn new(ctx: Arc<EngineContext>) -> Self {
        Self { ctx }
    }

    /// Platform entry point. The pointer count forwarded on `Up` is the one
    /// recorded by the previous event, not the count carried by `event`.
    pub fn handle_event(&self, event: PointerEvent) {
        let mut state = self.ctx.gate.enter("input_event");
        if state.video.is_active() {
            skip_gesture(&mut state);
            return;
        }

        match event.action {
            PointerAction::Down => pointer_down(&mut state, event.x, event.y, event.pointer_count),
            PointerAction::Move => pointer_move(&mut state, event.x, event.y),
            PointerAction::Up => {
                let prior = state.touch.pointer_count;
                pointer_up(&mut state, event.x, event.y, prior);
            }
            PointerAction::Other => {}
        }
        state.touch.pointer_count = event.pointer_count;
    }

    pub fn on_pointer_down(&self, px: f32, py: f32, pointer_count: u32) {
        let mut state = self.ctx.gate.enter("input_down");
        if state.video.is_active() {
            skip_gesture(&mut state);
        } else {
            pointer_down(&mut state, px, py, pointer_count);
        }
    }

    pub fn on_pointer_move(&self, px: f32, py: f32) {
        let mut state = self.ctx.gate.enter("input_move");
        if state.video.is_active() {
            skip_gesture(&mut state);
        } else {
            pointer_move(&mut state, px, py);
        }
    }

    pub fn on_pointer_up(&self, px: f32, py: f32, prior_pointer_count: u32) {
        let mut state = self.ctx.gate.enter("input_up");
        if state.video.is_active() {
            skip_gesture(&mut state);
        } else {
            pointer_up(&mut state, px, py, prior_pointer_count);
        }
    }
}

fn pointer_down(state: &mut SharedState, px: f32, py: f32, pointer_count: u32) {
    let (x, y) = state.viewport.to_logical(px, py);
    state.touch.last_y = y;
    if let Some(engine) = state.live_engine() {
        engine.touch_start(x, y, pointer_count);
    }
}

// last_y is left alone on move; only pointer-down records it.
fn pointer_move(state: &mut SharedState, px: f32, py: f32) {
    let (x, y) = state.viewport.to_logical(px, py);
    if let Some(engine) = state.live_engine() {
        engine.touch_move(x, y);
    }
}

fn pointer_up(state: &mut SharedState, px: f32, py: f32, prior_pointer_count: u32) {
    let (x, y) = state.viewport.to_logical(px, py);
    if let Some(engine) = state.live_engine() {
        engine.touch_end(x, y, prior_pointer_count);
    }
}

fn skip_gesture(state: &mut SharedState) {
    let skippable = state.video.skippable();
    if let Some(engine) = state.live_engine() {
        trace!(skippable, "video_skip_gesture");
        engine.touch_start(0, 0, 1);
        engine.touch_end(0, 0, 1);
    }
}
