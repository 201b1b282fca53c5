//! Input model and router: pointer, wheel, and canvas events applied to a view.
//!
//! ARCHITECTURE
//! ============
//! Events arrive from the transport already decoded into [`InputEvent`].
//! [`route`] applies one event to a [`ViewState`] and, when a camera is
//! attached, to that camera, and reports the [`Navigation`] it performed.
//!
//! Drag deltas are measured against the pointer position recorded at the
//! previous move, never against the drag origin, so navigation is
//! incremental and independent of how often moves are delivered.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_ORBIT_SENSITIVITY;
use crate::resolution::{ResolutionController, Size};
use crate::settings::StreamSettings;
use crate::view::ViewState;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("aspect ratio must be a positive finite number, got {0}")]
    InvalidAspectRatio(f64),
    #[error("canvas size must be positive, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Orbits the camera while held.
    Left,
    /// Pans the camera while held.
    Right,
    /// Tracked but unbound.
    Middle,
}

/// A decoded client event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    CanvasResized { width: u32, height: u32 },
    SetAspectRatio { ratio: f64 },
    PointerDown { button: Button },
    PointerUp { button: Button },
    PointerMove { x: f64, y: f64, last_x: f64, last_y: f64 },
    Wheel { delta: f64 },
}

/// Pointer position in canvas space plus held buttons.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerState {
    pub x: f64,
    pub y: f64,
    /// Previous position as reported by the client.
    pub last_x: f64,
    pub last_y: f64,
    pub left_down: bool,
    pub right_down: bool,
    /// Whether any move has been recorded yet.
    pub tracked: bool,
}

/// Camera operation performed for an event.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Navigation {
    #[default]
    None,
    /// Radians, after sensitivity.
    Orbit { yaw: f64, pitch: f64 },
    /// Raw pointer pixels; the camera applies its pan gain.
    Pan { dx: f64, dy: f64 },
    /// Raw wheel units; the camera applies its zoom gain.
    Zoom { delta: f64 },
}

/// Apply one event to `view`.
///
/// Navigation is reported even without a camera so callers can observe the
/// gesture; it is only applied when `view.camera` is set.
///
/// # Errors
///
/// Returns an [`InputError`] for an empty canvas or an invalid aspect ratio;
/// `view` is unchanged in that case.
pub fn route(view: &mut ViewState, settings: &StreamSettings, event: InputEvent) -> Result<Navigation, InputError> {
    match event {
        InputEvent::CanvasResized { width, height } => {
            resize_canvas(view, settings, Size::new(width, height))?;
            Ok(Navigation::None)
        }
        InputEvent::SetAspectRatio { ratio } => {
            set_aspect_ratio(view, settings, ratio)?;
            Ok(Navigation::None)
        }
        InputEvent::PointerDown { button } => {
            set_button(&mut view.pointer, button, true);
            Ok(Navigation::None)
        }
        InputEvent::PointerUp { button } => {
            set_button(&mut view.pointer, button, false);
            Ok(Navigation::None)
        }
        InputEvent::PointerMove { x, y, last_x, last_y } => Ok(pointer_move(view, x, y, last_x, last_y)),
        InputEvent::Wheel { delta } => {
            if let Some(camera) = view.camera.as_mut() {
                camera.zoom(delta);
            }
            Ok(Navigation::Zoom { delta })
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

/// Record the canvas. The first report also seeds the render size, clamped to
/// the pixel bounds in dynamic mode.
fn resize_canvas(view: &mut ViewState, settings: &StreamSettings, canvas: Size) -> Result<(), InputError> {
    if canvas.is_empty() {
        return Err(InputError::EmptyCanvas { width: canvas.width, height: canvas.height });
    }
    view.canvas = Some(canvas);
    if view.render.is_none() {
        view.render = Some(if settings.is_dynamic() {
            ResolutionController::new(settings, view.aspect_ratio)
                .clamp_with_ratio(f64::from(canvas.width), f64::from(canvas.height))
        } else {
            canvas
        });
    }
    Ok(())
}

/// Store the ratio. In dynamic mode the render size is reshaped around its
/// shorter side and re-clamped.
fn set_aspect_ratio(view: &mut ViewState, settings: &StreamSettings, ratio: f64) -> Result<(), InputError> {
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(InputError::InvalidAspectRatio(ratio));
    }
    view.aspect_ratio = ratio;

    let Some(render) = view.render else {
        return Ok(());
    };
    if settings.is_dynamic() {
        let short = f64::from(render.width.min(render.height));
        let (width, height) = if ratio < 1.0 { (short / ratio, short) } else { (short, short * ratio) };
        view.render = Some(ResolutionController::new(settings, ratio).clamp_with_ratio(width, height));
    }
    Ok(())
}

fn set_button(pointer: &mut PointerState, button: Button, down: bool) {
    match button {
        Button::Left => pointer.left_down = down,
        Button::Right => pointer.right_down = down,
        Button::Middle => {}
    }
}

/// The very first move has no recorded predecessor, so the client's own
/// previous position stands in for it.
fn pointer_move(view: &mut ViewState, x: f64, y: f64, last_x: f64, last_y: f64) -> Navigation {
    let (prev_x, prev_y) = if view.pointer.tracked { (view.pointer.x, view.pointer.y) } else { (last_x, last_y) };
    let dx = x - prev_x;
    let dy = y - prev_y;
    view.pointer = PointerState { x, y, last_x, last_y, tracked: true, ..view.pointer };

    let pointer = view.pointer;
    let orbit = view.camera.as_ref().map_or(DEFAULT_ORBIT_SENSITIVITY, |c| c.sensitivity().orbit);

    let navigation = if pointer.left_down {
        Navigation::Orbit { yaw: dx * orbit, pitch: dy * orbit }
    } else if pointer.right_down {
        Navigation::Pan { dx, dy }
    } else {
        Navigation::None
    };

    if let Some(camera) = view.camera.as_mut() {
        match navigation {
            Navigation::Orbit { yaw, pitch } => camera.rotate(yaw, pitch),
            Navigation::Pan { dx, dy } => camera.pan(dx, dy),
            Navigation::Zoom { .. } | Navigation::None => {}
        }
    }
    navigation
}
