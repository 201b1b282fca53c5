//! Stream settings: target frame rate, pixel bounds, and resolution mode.
//!
//! Every setter validates the complete candidate before touching `self`, so
//! a rejected call leaves the previous configuration in force.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ADJUSTMENT_STEP, DEFAULT_MAX_PIXEL, DEFAULT_MIN_PIXEL, DEFAULT_TARGET_FPS, MAX_ADJUSTMENT_STEP,
    MAX_ENCODABLE_PIXEL, MIN_ADJUSTMENT_STEP, MIN_TARGET_FPS,
};
use crate::resolution::Size;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("target fps must be a finite number of at least {min}, got {0}", min = MIN_TARGET_FPS)]
    InvalidFps(f64),
    #[error("min_pixel must be at least 1, got {0}")]
    MinPixelTooSmall(u32),
    #[error("max_pixel ({max}) must be greater than or equal to min_pixel ({min})")]
    MaxBelowMin { min: u32, max: u32 },
    #[error("max_pixel must be at most {limit}, got {0}", limit = MAX_ENCODABLE_PIXEL)]
    MaxPixelTooLarge(u32),
    #[error("adjustment_step must be within [0.001, 1], got {0}")]
    InvalidAdjustmentStep(f64),
    #[error("fixed resolution must be 1..={limit} per side, got {width}x{height}", limit = MAX_ENCODABLE_PIXEL)]
    InvalidFixedSize { width: u32, height: u32 },
    #[error("fixed resolution needs both width and height")]
    PartialFixedSize,
}

/// How the render size is chosen each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ResolutionMode {
    /// Latency-driven size within the pixel bounds.
    #[default]
    Dynamic,
    /// A constant size. `None` freezes whatever size is current.
    Fixed { size: Option<Size> },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamSettings {
    target_fps: f64,
    min_pixel: u32,
    max_pixel: u32,
    adjustment_step: f64,
    mode: ResolutionMode,
    force_fixed_aspect: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_TARGET_FPS,
            min_pixel: DEFAULT_MIN_PIXEL,
            max_pixel: DEFAULT_MAX_PIXEL,
            adjustment_step: DEFAULT_ADJUSTMENT_STEP,
            mode: ResolutionMode::Dynamic,
            force_fixed_aspect: true,
        }
    }
}

impl StreamSettings {
    // --- Accessors ---

    #[must_use]
    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    /// Time budget for one frame at the target rate, never longer than the
    /// interval at [`MIN_TARGET_FPS`].
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.target_fps.max(MIN_TARGET_FPS))
    }

    #[must_use]
    pub fn min_pixel(&self) -> u32 {
        self.min_pixel
    }

    #[must_use]
    pub fn max_pixel(&self) -> u32 {
        self.max_pixel
    }

    #[must_use]
    pub fn adjustment_step(&self) -> f64 {
        self.adjustment_step
    }

    #[must_use]
    pub fn mode(&self) -> ResolutionMode {
        self.mode
    }

    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.mode, ResolutionMode::Dynamic)
    }

    #[must_use]
    pub fn force_fixed_aspect(&self) -> bool {
        self.force_fixed_aspect
    }

    // --- Setters ---

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFps`] for non-finite values and anything
    /// below [`MIN_TARGET_FPS`].
    pub fn set_target_fps(&mut self, fps: f64) -> Result<(), ConfigError> {
        if !fps.is_finite() || fps < MIN_TARGET_FPS {
            return Err(ConfigError::InvalidFps(fps));
        }
        self.target_fps = fps;
        Ok(())
    }

    /// Switch to dynamic resolution, optionally replacing the bounds and step.
    /// Omitted values keep their current setting; `max_pixel` is checked
    /// against the effective `min_pixel`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid value; nothing
    /// is changed in that case, including the mode.
    pub fn set_dynamic_resolution(
        &mut self,
        min_pixel: Option<u32>,
        max_pixel: Option<u32>,
        adjustment_step: Option<f64>,
    ) -> Result<(), ConfigError> {
        let min = min_pixel.unwrap_or(self.min_pixel);
        let max = max_pixel.unwrap_or(self.max_pixel);
        let step = adjustment_step.unwrap_or(self.adjustment_step);

        if min < 1 {
            return Err(ConfigError::MinPixelTooSmall(min));
        }
        if max < min {
            return Err(ConfigError::MaxBelowMin { min, max });
        }
        if max > MAX_ENCODABLE_PIXEL {
            return Err(ConfigError::MaxPixelTooLarge(max));
        }
        if !(MIN_ADJUSTMENT_STEP..=MAX_ADJUSTMENT_STEP).contains(&step) {
            return Err(ConfigError::InvalidAdjustmentStep(step));
        }

        self.min_pixel = min;
        self.max_pixel = max;
        self.adjustment_step = step;
        self.mode = ResolutionMode::Dynamic;
        Ok(())
    }

    /// Switch to a fixed render size. With neither dimension given the
    /// current size is frozen.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PartialFixedSize`] when only one dimension is
    /// given and [`ConfigError::InvalidFixedSize`] for a zero dimension or
    /// one above [`MAX_ENCODABLE_PIXEL`].
    pub fn set_fixed_resolution(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        force_fixed_aspect: Option<bool>,
    ) -> Result<(), ConfigError> {
        let size = match (width, height) {
            (Some(width), Some(height)) => {
                let encodable = 1..=MAX_ENCODABLE_PIXEL;
                if !encodable.contains(&width) || !encodable.contains(&height) {
                    return Err(ConfigError::InvalidFixedSize { width, height });
                }
                Some(Size::new(width, height))
            }
            (None, None) => None,
            _ => return Err(ConfigError::PartialFixedSize),
        };

        self.mode = ResolutionMode::Fixed { size };
        if let Some(force) = force_fixed_aspect {
            self.force_fixed_aspect = force;
        }
        Ok(())
    }

    pub fn set_force_fixed_aspect(&mut self, force: bool) {
        self.force_fixed_aspect = force;
    }
}
