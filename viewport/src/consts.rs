//! Shared numeric constants for the viewport crate.

// ── Stream defaults ─────────────────────────────────────────────

/// Frame rate the resolution controller aims for when nothing is configured.
pub const DEFAULT_TARGET_FPS: f64 = 60.0;

/// Slowest accepted target frame rate: one frame every 1000 seconds.
pub const MIN_TARGET_FPS: f64 = 1e-3;

/// Largest frame side the JPEG encoder accepts, in pixels.
pub const MAX_ENCODABLE_PIXEL: u32 = 65_535;

/// Lower bound for either render dimension, in pixels.
pub const DEFAULT_MIN_PIXEL: u32 = 256;

/// Upper bound for either render dimension, in pixels.
pub const DEFAULT_MAX_PIXEL: u32 = 1024;

/// Fraction of the gap to the ideal size closed per frame.
pub const DEFAULT_ADJUSTMENT_STEP: f64 = 0.05;

/// Smallest accepted adjustment step.
pub const MIN_ADJUSTMENT_STEP: f64 = 1e-3;

/// Largest accepted adjustment step (reach the target in one tick).
pub const MAX_ADJUSTMENT_STEP: f64 = 1.0;

/// Render aspect ratio (height / width) before the client reports one.
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;

/// Tolerance below which two aspect ratios are considered equal.
pub const ASPECT_EPSILON: f64 = 1e-6;

// ── Navigation ──────────────────────────────────────────────────

/// Orbit rotation per pointer pixel, in radians.
pub const DEFAULT_ORBIT_SENSITIVITY: f64 = 0.005;

/// Pan translation per pointer pixel, in world units.
pub const DEFAULT_PAN_SENSITIVITY: f64 = 0.01;

/// Dolly translation per wheel unit, in world units.
pub const DEFAULT_ZOOM_SENSITIVITY: f64 = 0.001;

// ── Camera ──────────────────────────────────────────────────────

/// Default near clipping plane distance.
pub const DEFAULT_NEAR: f64 = 0.01;

/// Default far clipping plane distance.
pub const DEFAULT_FAR: f64 = 100.0;

/// Default horizontal field of view, in radians (60°).
pub const DEFAULT_FOV_X: f64 = std::f64::consts::FRAC_PI_3;
