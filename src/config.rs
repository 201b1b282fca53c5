//! Server and session configuration parsed from environment variables.
//!
//! Every knob has a default. Unparseable numeric values fall back to their
//! default; values that parse but break a settings invariant (for example
//! `MAX_PIXEL < MIN_PIXEL`) are rejected at startup.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;
use std::time::Duration;

use glam::DVec3;
use viewport::camera::{Camera, CameraError, Intrinsics, Sensitivity};
use viewport::consts::{
    DEFAULT_ADJUSTMENT_STEP, DEFAULT_ASPECT_RATIO, DEFAULT_FOV_X, DEFAULT_MAX_PIXEL, DEFAULT_MIN_PIXEL,
    DEFAULT_ORBIT_SENSITIVITY, DEFAULT_PAN_SENSITIVITY, DEFAULT_TARGET_FPS, DEFAULT_ZOOM_SENSITIVITY,
};
use viewport::settings::{ConfigError, StreamSettings};
use viewport::view::ViewState;

use crate::session::{DEFAULT_CANVAS_POLL_MS, DEFAULT_NO_FRAME_BACKOFF_MS, SessionTiming};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("invalid stream settings: {0}")]
    Settings(#[from] ConfigError),
    #[error("invalid camera: {0}")]
    Camera(#[from] CameraError),
    #[error("unknown RESOLUTION_MODE: {0} (expected dynamic or fixed)")]
    UnknownResolutionMode(String),
}

// =============================================================================
// PARSING
// =============================================================================

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    parse_or(std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse::<T>().ok()).unwrap_or(default)
}

fn parse_opt<T: FromStr>(raw: Option<String>) -> Option<T> {
    raw.and_then(|v| v.trim().parse::<T>().ok())
}

// =============================================================================
// SERVER
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// One session for every connection instead of one per connection.
    pub shared_session: bool,
}

impl ServerConfig {
    /// Optional:
    /// - `PORT`: default 3000
    /// - `SHARED_SESSION`: `true` or `false` (default)
    #[must_use]
    pub fn from_env() -> Self {
        Self { port: env_parse("PORT", DEFAULT_PORT), shared_session: env_parse("SHARED_SESSION", false) }
    }
}

// =============================================================================
// SESSION TEMPLATE
// =============================================================================

/// Declarative recipe for new sessions. Every session starts from a fresh
/// copy of these values, never from another session's live state.
#[derive(Debug, Clone)]
pub struct SessionTemplate {
    pub settings: StreamSettings,
    pub aspect_ratio: f64,
    pub camera: Option<Camera>,
    pub timing: SessionTiming,
}

impl Default for SessionTemplate {
    fn default() -> Self {
        Self {
            settings: StreamSettings::default(),
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            camera: None,
            timing: SessionTiming::default(),
        }
    }
}

impl SessionTemplate {
    /// Build the template from environment variables.
    ///
    /// Optional:
    /// - `TARGET_FPS`: default 60
    /// - `MIN_PIXEL`, `MAX_PIXEL`: default 256, 1024
    /// - `ADJUSTMENT_STEP`: default 0.05
    /// - `RESOLUTION_MODE`: `dynamic` (default) or `fixed`
    /// - `FIXED_WIDTH`, `FIXED_HEIGHT`: fixed size; both or neither
    /// - `FORCE_FIXED_ASPECT`: default `true`
    /// - `ORBIT_SENSITIVITY`, `PAN_SENSITIVITY`, `ZOOM_SENSITIVITY`
    /// - `CANVAS_POLL_MS`, `NO_FRAME_BACKOFF_MS`: default 200, 100
    ///
    /// # Errors
    ///
    /// Returns a [`TemplateError`] if the values violate a settings invariant
    /// or name an unknown resolution mode.
    pub fn from_env() -> Result<Self, TemplateError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with a caller-supplied variable source.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, TemplateError> {
        let mut settings = StreamSettings::default();
        settings.set_target_fps(parse_or(lookup("TARGET_FPS"), DEFAULT_TARGET_FPS))?;
        settings.set_dynamic_resolution(
            Some(parse_or(lookup("MIN_PIXEL"), DEFAULT_MIN_PIXEL)),
            Some(parse_or(lookup("MAX_PIXEL"), DEFAULT_MAX_PIXEL)),
            Some(parse_or(lookup("ADJUSTMENT_STEP"), DEFAULT_ADJUSTMENT_STEP)),
        )?;

        let mode = lookup("RESOLUTION_MODE").unwrap_or_else(|| "dynamic".into());
        match mode.trim().to_ascii_lowercase().as_str() {
            "dynamic" => {}
            "fixed" => {
                let (width, height) = (parse_opt(lookup("FIXED_WIDTH")), parse_opt(lookup("FIXED_HEIGHT")));
                settings.set_fixed_resolution(width, height, None)?;
            }
            _ => return Err(TemplateError::UnknownResolutionMode(mode)),
        }
        settings.set_force_fixed_aspect(parse_or(lookup("FORCE_FIXED_ASPECT"), true));

        let sensitivity = Sensitivity {
            orbit: parse_or(lookup("ORBIT_SENSITIVITY"), DEFAULT_ORBIT_SENSITIVITY),
            pan: parse_or(lookup("PAN_SENSITIVITY"), DEFAULT_PAN_SENSITIVITY),
            zoom: parse_or(lookup("ZOOM_SENSITIVITY"), DEFAULT_ZOOM_SENSITIVITY),
        };

        let timing = SessionTiming {
            canvas_poll: Duration::from_millis(parse_or(lookup("CANVAS_POLL_MS"), DEFAULT_CANVAS_POLL_MS)),
            no_frame_backoff: Duration::from_millis(parse_or(
                lookup("NO_FRAME_BACKOFF_MS"),
                DEFAULT_NO_FRAME_BACKOFF_MS,
            )),
        };

        Ok(Self {
            settings,
            aspect_ratio: DEFAULT_ASPECT_RATIO,
            camera: Some(default_camera(settings.max_pixel(), sensitivity)?),
            timing,
        })
    }

    /// Fresh view state for a new session.
    #[must_use]
    pub fn view(&self) -> ViewState {
        ViewState::new(self.aspect_ratio, self.camera.clone())
    }
}

/// Square camera a few units back from the origin, looking at it with +y up.
fn default_camera(pixels: u32, sensitivity: Sensitivity) -> Result<Camera, CameraError> {
    let intrinsics = Intrinsics::from_fov(DEFAULT_FOV_X, pixels, pixels)?;
    let camera = Camera::look_at(intrinsics, DVec3::new(0.0, 1.5, -4.0), DVec3::ZERO, DVec3::Y)?;
    Ok(camera.with_sensitivity(sensitivity))
}
