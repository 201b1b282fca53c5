//! Websocket message shapes.
//!
//! DESIGN
//! ======
//! Client messages are JSON text tagged by `type`. Input messages map one to
//! one onto [`InputEvent`]; the `set_*` messages change stream settings and
//! are answered with the resulting settings or an error. Server text
//! messages use the same tagging. Frames travel as binary JPEG messages and
//! never appear here.

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use viewport::input::{Button, InputEvent};
use viewport::settings::{ConfigError, StreamSettings};

// =============================================================================
// ERROR CODES
// =============================================================================

/// Grepable error code and retryable flag for structured error messages.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

impl ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        "E_CONFIG"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),
    #[error("binary messages are not accepted")]
    UnexpectedBinary,
    #[error("session has ended")]
    SessionClosed,
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidMessage(_) | Self::UnexpectedBinary => "E_PROTOCOL",
            Self::SessionClosed => "E_SESSION_CLOSED",
        }
    }
}

// =============================================================================
// CLIENT -> SERVER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CanvasResized {
        width: u32,
        height: u32,
    },
    SetAspectRatio {
        aspect_ratio: f64,
    },
    PointerDown {
        button: Button,
    },
    PointerUp {
        button: Button,
    },
    PointerMove {
        x: f64,
        y: f64,
        last_x: f64,
        last_y: f64,
    },
    Wheel {
        delta: f64,
    },
    SetTargetFps {
        fps: f64,
    },
    SetDynamicResolution {
        #[serde(default)]
        min_pixel: Option<u32>,
        #[serde(default)]
        max_pixel: Option<u32>,
        #[serde(default)]
        adjustment_step: Option<f64>,
    },
    SetFixedResolution {
        #[serde(default)]
        width: Option<u32>,
        #[serde(default)]
        height: Option<u32>,
        #[serde(default)]
        force_fixed_aspect: Option<bool>,
    },
}

impl ClientMessage {
    /// Parse one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidMessage`] for malformed JSON, an unknown
    /// `type`, or missing fields.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The input event this message carries, if it is an input message.
    #[must_use]
    pub fn input_event(&self) -> Option<InputEvent> {
        match *self {
            Self::CanvasResized { width, height } => Some(InputEvent::CanvasResized { width, height }),
            Self::SetAspectRatio { aspect_ratio } => Some(InputEvent::SetAspectRatio { ratio: aspect_ratio }),
            Self::PointerDown { button } => Some(InputEvent::PointerDown { button }),
            Self::PointerUp { button } => Some(InputEvent::PointerUp { button }),
            Self::PointerMove { x, y, last_x, last_y } => Some(InputEvent::PointerMove { x, y, last_x, last_y }),
            Self::Wheel { delta } => Some(InputEvent::Wheel { delta }),
            Self::SetTargetFps { .. } | Self::SetDynamicResolution { .. } | Self::SetFixedResolution { .. } => None,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected { client_id: Uuid, session_id: Uuid, shared: bool, settings: StreamSettings },
    Settings { settings: StreamSettings },
    Error { code: String, message: String, retryable: bool },
}

impl ServerMessage {
    #[must_use]
    pub fn error_from(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self::Error { code: err.error_code().to_string(), message: err.to_string(), retryable: err.retryable() }
    }
}
