//! Resolution controller: latency-driven sizing, aspect clamping, letterboxing.
//!
//! DESIGN
//! ======
//! The controller is a plain value built from the current settings and the
//! render aspect ratio (height / width) at the start of each tick. It never
//! owns the render size; callers pass the current size in and commit the
//! returned one.
//!
//! Sizes travel as `f64` until the final step and are rounded, not
//! truncated, so a render time exactly on budget is a fixed point.
//!
//! At the pixel bounds the aspect ratio is only approximately honored:
//! keeping both sides in range wins over keeping the ratio exact.

#[cfg(test)]
#[path = "resolution_test.rs"]
mod resolution_test;

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{ASPECT_EPSILON, DEFAULT_ASPECT_RATIO, MAX_ENCODABLE_PIXEL};
use crate::settings::StreamSettings;

// =============================================================================
// VALUE TYPES
// =============================================================================

/// Raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height over width.
    #[must_use]
    pub fn aspect_ratio(self) -> f64 {
        f64::from(self.height) / f64::from(self.width)
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Outer size after adding `padding` on every side. Saturates at
    /// `u32::MAX`.
    #[must_use]
    pub fn padded(self, padding: Padding) -> Self {
        Self {
            width: self.width.saturating_add(padding.x.saturating_mul(2)),
            height: self.height.saturating_add(padding.y.saturating_mul(2)),
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn from_f64(width: f64, height: f64) -> Self {
        Self { width: width.round() as u32, height: height.round() as u32 }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Zero-filled border added to each side of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Padding {
    /// Columns added to the left and to the right.
    pub x: u32,
    /// Rows added to the top and to the bottom.
    pub y: u32,
}

impl Padding {
    pub const ZERO: Self = Self { x: 0, y: 0 };

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionController {
    min_pixel: f64,
    max_pixel: f64,
    adjustment_step: f64,
    target_fps: f64,
    aspect_ratio: f64,
}

impl ResolutionController {
    /// Snapshot the settings. A non-positive or non-finite `aspect_ratio`
    /// falls back to square.
    #[must_use]
    pub fn new(settings: &StreamSettings, aspect_ratio: f64) -> Self {
        let aspect_ratio =
            if aspect_ratio.is_finite() && aspect_ratio > 0.0 { aspect_ratio } else { DEFAULT_ASPECT_RATIO };
        Self {
            min_pixel: f64::from(settings.min_pixel()),
            max_pixel: f64::from(settings.max_pixel()),
            adjustment_step: settings.adjustment_step(),
            target_fps: settings.target_fps(),
            aspect_ratio,
        }
    }

    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Force `height / width` onto the aspect ratio while keeping both
    /// sides within `[min_pixel, max_pixel]`.
    ///
    /// Wide ratios (< 1) let the height drive and derive the width; tall or
    /// square ratios let the width drive and derive the height. The driving
    /// side is clipped into range first, so the derived side, which is never
    /// shorter, can only overflow the maximum; when it does it is pinned there
    /// and the driving side is recomputed (but kept at or above the minimum).
    #[must_use]
    pub fn clamp_with_ratio(&self, width: f64, height: f64) -> Size {
        let (min, max, ar) = (self.min_pixel, self.max_pixel, self.aspect_ratio);

        if ar < 1.0 {
            let height = height.clamp(min, max);
            let width = height / ar;
            if width > max {
                return Size::from_f64(max, (max * ar).max(min));
            }
            Size::from_f64(width, height)
        } else {
            let width = width.clamp(min, max);
            let height = width * ar;
            if height > max {
                return Size::from_f64((max / ar).max(min), max);
            }
            Size::from_f64(width, height)
        }
    }

    /// One controller step. Returns the new size, or `None` when nothing
    /// should change (no latency sample yet, or the rounded size is the same).
    #[must_use]
    pub fn adjust(&self, current: Size, render_time: Duration) -> Option<Size> {
        let secs = render_time.as_secs_f64();
        if secs <= 0.0 || current.is_empty() {
            return None;
        }

        let ratio = (1.0 / secs) / self.target_fps;
        let width = f64::from(current.width);
        let height = f64::from(current.height);

        let scale = if ratio < 1.0 {
            // Too slow: shrink, but never below the floor.
            (self.min_pixel / width.max(height)).max(ratio)
        } else {
            // Fast enough: grow, but never above the ceiling.
            (self.max_pixel / width.min(height)).min(ratio)
        };

        let step = |cur: f64| (cur + (cur * scale - cur) * self.adjustment_step).clamp(self.min_pixel, self.max_pixel);
        let next = self.clamp_with_ratio(step(width), step(height));

        (next != current).then_some(next)
    }
}

// =============================================================================
// LETTERBOX
// =============================================================================

/// Padding that grows `render` to the canvas aspect ratio without cropping.
///
/// Returns zero padding when either size is empty or the two aspect ratios
/// already agree. Each padded side is capped at [`MAX_ENCODABLE_PIXEL`], so
/// for extreme canvas ratios the frame only approaches the canvas ratio.
#[must_use]
pub fn letterbox_padding(render: Size, canvas: Size) -> Padding {
    if render.is_empty() || canvas.is_empty() {
        return Padding::ZERO;
    }
    let canvas_ar = canvas.aspect_ratio();
    if (canvas_ar - render.aspect_ratio()).abs() < ASPECT_EPSILON {
        return Padding::ZERO;
    }

    let width = f64::from(render.width);
    let height = f64::from(render.height);
    let scale = height.max(width * canvas_ar);

    let x = ((scale / canvas_ar - width) / 2.0).max(0.0);
    let y = ((scale - height) / 2.0).max(0.0);
    let floored = Size::from_f64(x.floor(), y.floor());
    Padding {
        x: floored.width.min(MAX_ENCODABLE_PIXEL.saturating_sub(render.width) / 2),
        y: floored.height.min(MAX_ENCODABLE_PIXEL.saturating_sub(render.height) / 2),
    }
}
