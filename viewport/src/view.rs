//! Loop-owned view state: render and canvas sizes, padding, pointer, camera.
//!
//! A `ViewState` belongs to exactly one session loop. The input router and
//! the resolution controller both mutate it, always from that loop, so no
//! locking happens here.

#[cfg(test)]
#[path = "view_test.rs"]
mod view_test;

use crate::camera::Camera;
use crate::consts::DEFAULT_ASPECT_RATIO;
use crate::input::PointerState;
use crate::resolution::{Padding, Size, letterbox_padding};
use crate::settings::{ResolutionMode, StreamSettings};

#[derive(Debug, Clone)]
pub struct ViewState {
    /// Current output raster size. `None` until the client reports a canvas
    /// or a fixed size is configured.
    pub render: Option<Size>,
    /// Last-known client viewport.
    pub canvas: Option<Size>,
    /// Target render height / width.
    pub aspect_ratio: f64,
    pub padding: Padding,
    pub pointer: PointerState,
    pub camera: Option<Camera>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(DEFAULT_ASPECT_RATIO, None)
    }
}

impl ViewState {
    #[must_use]
    pub fn new(aspect_ratio: f64, camera: Option<Camera>) -> Self {
        Self {
            render: None,
            canvas: None,
            aspect_ratio,
            padding: Padding::ZERO,
            pointer: PointerState::default(),
            camera,
        }
    }

    /// Canvas height / width, if a non-empty canvas has been reported.
    #[must_use]
    pub fn canvas_aspect_ratio(&self) -> Option<f64> {
        self.canvas.filter(|c| !c.is_empty()).map(Size::aspect_ratio)
    }

    /// Render size after the configured mode is applied. A fixed mode with an
    /// explicit size overrides whatever the controller last chose.
    #[must_use]
    pub fn effective_render_size(&self, settings: &StreamSettings) -> Option<Size> {
        match settings.mode() {
            ResolutionMode::Fixed { size: Some(size) } => Some(size),
            _ => self.render,
        }
    }

    /// Recompute letterbox padding for the current render and canvas sizes.
    pub fn refresh_padding(&mut self, settings: &StreamSettings) -> Padding {
        self.padding = match (self.render, self.canvas) {
            (Some(render), Some(canvas)) if settings.force_fixed_aspect() => letterbox_padding(render, canvas),
            _ => Padding::ZERO,
        };
        self.padding
    }

    /// Size of the frame the client actually receives.
    #[must_use]
    pub fn padded_size(&self) -> Option<Size> {
        self.render.map(|r| r.padded(self.padding))
    }

    /// Pointer position mapped from canvas space into render pixels.
    ///
    /// Accounts for letterbox padding, so a pointer over the padding maps to
    /// a coordinate outside `[0, render)`. Returns `None` before both sizes
    /// are known.
    #[must_use]
    pub fn cursor_in_pixels(&self) -> Option<(f64, f64)> {
        let padded = self.padded_size()?;
        let canvas = self.canvas.filter(|c| !c.is_empty())?;
        let x = self.pointer.x * f64::from(padded.width) / f64::from(canvas.width) - f64::from(self.padding.x);
        let y = self.pointer.y * f64::from(padded.height) / f64::from(canvas.height) - f64::from(self.padding.y);
        Some((x, y))
    }
}
