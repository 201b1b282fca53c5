//! View logic for the remote viewer: camera, stream settings, resolution
//! control, and input routing.
//!
//! This crate is pure and synchronous. It owns no sockets, threads, or
//! clocks; the server crate drives it from each session loop and feeds it
//! measured render times and decoded client events.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`camera`] | Pinhole camera, rigid pose pair, orbit/pan/zoom, pose conventions |
//! | [`settings`] | Validated stream settings and resolution mode |
//! | [`resolution`] | Latency-driven sizing, aspect clamping, letterbox padding |
//! | [`view`] | Per-session view state and cursor mapping |
//! | [`input`] | Client event types and the input router |
//! | [`consts`] | Shared numeric defaults |

pub mod camera;
pub mod consts;
pub mod input;
pub mod resolution;
pub mod settings;
pub mod view;

pub use camera::{Camera, CameraError};
pub use input::{InputError, InputEvent, Navigation};
pub use resolution::{Padding, ResolutionController, Size};
pub use settings::{ConfigError, ResolutionMode, StreamSettings};
pub use view::ViewState;
