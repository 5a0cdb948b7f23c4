use serde::Deserialize;

pub const LOGICAL_WIDTH: u32 = 1280;
pub const LOGICAL_HEIGHT: u32 = 720;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct LogicalCanvas {
    pub width: u32,
    pub height: u32,
}

impl Default for LogicalCanvas {
    fn default() -> Self {
        Self {
            width: LOGICAL_WIDTH,
            height: LOGICAL_HEIGHT,
        }
    }
}

/// Placement of the logical canvas inside a window: the canvas is scaled
/// uniformly, centered, and letterboxed on at most one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub canvas: LogicalCanvas,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0,
            offset_y: 0,
            canvas: LogicalCanvas::default(),
        }
    }
}

impl Viewport {
    pub fn recompute(window_width: u32, window_height: u32) -> Self {
        Self::fit(window_width, window_height, LogicalCanvas::default())
    }

    pub fn fit(window_width: u32, window_height: u32, canvas: LogicalCanvas) -> Self {
        let window_w = window_width as f32;
        let window_h = window_height as f32;
        let canvas_w = canvas.width as f32;
        let canvas_h = canvas.height as f32;
        let aspect = canvas_h / canvas_w;

        // Width-first.
        let w = window_w;
        let h = w * aspect;
        let mut viewport = Self {
            scale: w / canvas_w,
            offset_x: 0,
            offset_y: ((window_h - h) / 2.0) as i32,
            canvas,
        };

        // Height-first.
        if h > window_h {
            let h = window_h;
            let w = h / aspect;
            viewport.scale = h / canvas_h;
            viewport.offset_x = ((window_w - w) / 2.0) as i32;
            viewport.offset_y = 0;
        }

        viewport
    }

    /// Maps a physical pointer position to logical canvas coordinates,
    /// truncating toward zero.
    pub fn to_logical(&self, px: f32, py: f32) -> (i32, i32) {
        let x = (px - self.offset_x as f32) / self.scale;
        let y = (py - self.offset_y as f32) / self.scale;
        (x as i32, y as i32)
    }

    /// Physical rectangle `(x, y, w, h)` the canvas occupies in the window.
    pub fn physical_rect(&self) -> (i32, i32, u32, u32) {
        (
            self.offset_x,
            self.offset_y,
            (self.canvas.width as f32 * self.scale) as u32,
            (self.canvas.height as f32 * self.scale) as u32,
        )
    }
}

/// Size of the video surface for the available space: the longer canvas axis
/// follows the other one through the canvas aspect ratio.
pub fn measure_video_surface(
    available_width: u32,
    available_height: u32,
    canvas: LogicalCanvas,
) -> (u32, u32) {
    let canvas_w = u64::from(canvas.width.max(1));
    let canvas_h = u64::from(canvas.height.max(1));
    if canvas_w > canvas_h {
        let width = u64::from(available_height) * canvas_w / canvas_h;
        (width as u32, available_height)
    } else {
        let height = u64::from(available_width) * canvas_h / canvas_w;
        (available_width, height as u32)
    }
}
