//! Render collaborator seam and the raster it produces.
//!
//! DESIGN
//! ======
//! The session loop never knows what draws the image. It hands a
//! [`RenderRequest`] to a [`Renderer`] on the blocking pool and receives a
//! tagged [`RenderOutcome`]:
//!
//! - `Frame`: a raster that must match the requested size exactly.
//! - `NoFrame`: nothing to show yet; the loop backs off and retries.
//! - `Unsupported`: this renderer cannot serve the session; the loop ends.
//!
//! Any `Err` is treated as an unexpected failure and ends the session.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use viewport::camera::Camera;
use viewport::input::PointerState;
use viewport::resolution::{Padding, Size};

// =============================================================================
// RASTER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("unsupported channel count {0}, expected 1, 3, or 4")]
    UnsupportedChannels(u8),
    #[error("buffer holds {actual} bytes, expected {expected}")]
    BufferLength { expected: usize, actual: usize },
    #[error("rendered {actual}, requested {expected}")]
    SizeMismatch { expected: Size, actual: Size },
}

/// Row-major, tightly packed 8-bit image. Grayscale, RGB, or RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl RasterImage {
    /// # Errors
    ///
    /// Returns a [`FrameError`] if the channel count is not 1, 3, or 4, or
    /// if `data` is not exactly `width * height * channels` bytes.
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self, FrameError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(FrameError::UnsupportedChannels(channels));
        }
        let expected = byte_len(width, height, channels);
        if data.len() != expected {
            return Err(FrameError::BufferLength { expected, actual: data.len() });
        }
        Ok(Self { width, height, channels, data })
    }

    /// Caller guarantees a valid channel count and buffer length.
    pub(crate) fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), byte_len(width, height, channels));
        Self { width, height, channels, data }
    }

    /// Solid RGB image.
    #[cfg(test)]
    #[must_use]
    pub fn filled_rgb(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb.iter().copied().cycle().take(byte_len(width, height, 3)).collect();
        Self { width, height, channels: 3, data }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[must_use]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// # Errors
    ///
    /// Returns [`FrameError::SizeMismatch`] when the raster is not `expected`.
    pub fn check_size(&self, expected: Size) -> Result<(), FrameError> {
        let actual = self.size();
        if actual != expected {
            return Err(FrameError::SizeMismatch { expected, actual });
        }
        Ok(())
    }
}

pub(crate) fn byte_len(width: u32, height: u32, channels: u8) -> usize {
    width as usize * height as usize * usize::from(channels)
}

// =============================================================================
// COLLABORATOR
// =============================================================================

/// Everything a renderer may read for one frame.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Exact raster size the renderer must return.
    pub size: Size,
    /// Letterbox padding that will be added around the raster.
    pub padding: Padding,
    /// Frames published by this session so far.
    pub frame_index: u64,
    /// Session camera with intrinsics scaled to `size`.
    pub camera: Option<Camera>,
    pub pointer: PointerState,
    /// Pointer in render pixel coordinates, when the canvas is known.
    pub cursor: Option<(f64, f64)>,
}

#[derive(Debug)]
pub enum RenderOutcome {
    Frame(RasterImage),
    NoFrame,
    Unsupported,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// External render function. Called from the blocking pool, one call at a
/// time per session.
pub trait Renderer: Send + Sync {
    /// # Errors
    ///
    /// Any error ends the calling session.
    fn render(&self, request: &RenderRequest) -> Result<RenderOutcome, RenderError>;
}
