//! Session loop: render, pad, encode, publish, and pace at the target rate.
//!
//! ARCHITECTURE
//! ============
//! One Tokio task per session owns the [`ViewState`] outright. Everything
//! else reaches it through a [`SessionHandle`]:
//!
//! - Input events go over an unbounded channel. The loop drains it at the
//!   start of each tick and keeps applying events while it sleeps, so input
//!   is never blocked by rendering.
//! - Stream settings sit behind a `std::sync::RwLock`. Setters validate under
//!   the write lock and the loop copies the settings once per tick.
//!
//! The render call, raster validation, padding, and JPEG encoding all run
//! together on the blocking pool.
//!
//! LIFECYCLE
//! =========
//! 1. WaitingForCanvas: poll until a render size is known (first canvas
//!    report or an explicit fixed size).
//! 2. Running: tick until the renderer says `Unsupported`, an error occurs,
//!    or every handle is dropped.
//! 3. Terminated: the task returns its [`SessionExit`] or [`SessionError`].
//!
//! ERROR HANDLING
//! ==============
//! `NoFrame` is not an error: the loop backs off, forgets the last render
//! time, and retries. Render errors, renderer panics, malformed rasters, and
//! encoder failures end this session only.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use viewport::input::{self, InputEvent, Navigation};
use viewport::resolution::ResolutionController;
use viewport::settings::{ConfigError, ResolutionMode, StreamSettings};
use viewport::view::ViewState;

use crate::config::SessionTemplate;
use crate::encode::{self, EncodeError, EncodedFrame, JPEG_QUALITY};
use crate::protocol::ErrorCode;
use crate::publish::{PublishTarget, Publisher};
use crate::render::{FrameError, RenderError, RenderOutcome, RenderRequest, Renderer};

pub const DEFAULT_CANVAS_POLL_MS: u64 = 200;
pub const DEFAULT_NO_FRAME_BACKOFF_MS: u64 = 100;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    /// Poll interval while waiting for the first render size.
    pub canvas_poll: Duration,
    /// Pause after the renderer reports `NoFrame`.
    pub no_frame_backoff: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            canvas_poll: Duration::from_millis(DEFAULT_CANVAS_POLL_MS),
            no_frame_backoff: Duration::from_millis(DEFAULT_NO_FRAME_BACKOFF_MS),
        }
    }
}

/// Clean ways for a session to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    /// Every handle was dropped.
    Disconnected,
    /// The renderer cannot serve this session.
    Unsupported,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("renderer panicked: {0}")]
    Panicked(String),
    #[error("invalid frame: {0}")]
    Frame(#[from] FrameError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Render(_) => "E_RENDER",
            Self::Panicked(_) => "E_RENDER_PANIC",
            Self::Frame(_) => "E_FRAME",
            Self::Encode(_) => "E_ENCODE",
        }
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Published,
    /// No frame this tick (`NoFrame`, or no render size yet).
    Skipped,
    Terminated(SessionExit),
}

/// Blocking-pool result of one render pass.
enum Produced {
    Frame(EncodedFrame),
    NoFrame,
    Unsupported,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable control surface for a running session. The loop ends once every
/// clone is dropped.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    settings: Arc<RwLock<StreamSettings>>,
    input_tx: mpsc::UnboundedSender<InputEvent>,
}

impl SessionHandle {
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Queue an input event. Returns `false` once the loop has ended.
    pub fn send(&self, event: InputEvent) -> bool {
        self.input_tx.send(event).is_ok()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.input_tx.is_closed()
    }

    #[must_use]
    pub fn settings(&self) -> StreamSettings {
        read_settings(&self.settings)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFps`]; the previous rate stays in force.
    pub fn set_target_fps(&self, fps: f64) -> Result<StreamSettings, ConfigError> {
        self.update(|s| s.set_target_fps(fps))
    }

    /// # Errors
    ///
    /// Returns the first invalid value; nothing changes in that case.
    pub fn set_dynamic_resolution(
        &self,
        min_pixel: Option<u32>,
        max_pixel: Option<u32>,
        adjustment_step: Option<f64>,
    ) -> Result<StreamSettings, ConfigError> {
        self.update(|s| s.set_dynamic_resolution(min_pixel, max_pixel, adjustment_step))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::PartialFixedSize`] or
    /// [`ConfigError::InvalidFixedSize`]; nothing changes in that case.
    pub fn set_fixed_resolution(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        force_fixed_aspect: Option<bool>,
    ) -> Result<StreamSettings, ConfigError> {
        self.update(|s| s.set_fixed_resolution(width, height, force_fixed_aspect))
    }

    /// Apply a validated change and return the resulting settings.
    fn update(
        &self,
        apply: impl FnOnce(&mut StreamSettings) -> Result<(), ConfigError>,
    ) -> Result<StreamSettings, ConfigError> {
        let mut guard = match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        apply(&mut guard)?;
        Ok(*guard)
    }
}

fn read_settings(lock: &RwLock<StreamSettings>) -> StreamSettings {
    match lock.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

// =============================================================================
// SPAWN
// =============================================================================

/// Start a session built from `template`. Frames go to `target`.
///
/// The returned join handle resolves when the loop ends; dropping it detaches
/// the task, which logs its own exit.
pub fn spawn(
    template: &SessionTemplate,
    target: PublishTarget,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
) -> (SessionHandle, JoinHandle<Result<SessionExit, SessionError>>) {
    let (session, handle) = Session::new(template, target, renderer, publisher);
    let id = handle.id;

    info!(session_id = %id, ?target, "session: spawned");
    let task = tokio::spawn(async move {
        let result = session.run().await;
        match &result {
            Ok(exit) => info!(session_id = %id, ?exit, "session: ended"),
            Err(e) => error!(session_id = %id, code = e.error_code(), error = %e, "session: failed"),
        }
        result
    });

    (handle, task)
}

// =============================================================================
// LOOP
// =============================================================================

pub(crate) struct Session {
    id: Uuid,
    target: PublishTarget,
    view: ViewState,
    settings: Arc<RwLock<StreamSettings>>,
    input_rx: mpsc::UnboundedReceiver<InputEvent>,
    renderer: Arc<dyn Renderer>,
    publisher: Arc<dyn Publisher>,
    timing: SessionTiming,
    /// Wall time of the previous published tick; zero when there is no sample.
    render_time: Duration,
    frames_published: u64,
}

impl Session {
    pub(crate) fn new(
        template: &SessionTemplate,
        target: PublishTarget,
        renderer: Arc<dyn Renderer>,
        publisher: Arc<dyn Publisher>,
    ) -> (Self, SessionHandle) {
        let id = Uuid::new_v4();
        let settings = Arc::new(RwLock::new(template.settings));
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let session = Self {
            id,
            target,
            view: template.view(),
            settings: Arc::clone(&settings),
            input_rx,
            renderer,
            publisher,
            timing: template.timing,
            render_time: Duration::ZERO,
            frames_published: 0,
        };
        (session, SessionHandle { id, settings, input_tx })
    }

    async fn run(mut self) -> Result<SessionExit, SessionError> {
        if !self.wait_for_canvas().await {
            return Ok(SessionExit::Disconnected);
        }
        info!(session_id = %self.id, render = ?self.view.render, "session: canvas ready");

        loop {
            if let Tick::Terminated(exit) = self.tick().await? {
                return Ok(exit);
            }
        }
    }

    /// Block until a render size is known. Returns `false` on disconnect.
    async fn wait_for_canvas(&mut self) -> bool {
        loop {
            if !self.drain_input() {
                return false;
            }
            if self.view.effective_render_size(&self.settings()).is_some() {
                return true;
            }
            if !self.pause(self.timing.canvas_poll).await {
                return false;
            }
        }
    }

    /// One pass of resize, render, publish, and pace.
    pub(crate) async fn tick(&mut self) -> Result<Tick, SessionError> {
        let tick_start = Instant::now();
        if !self.drain_input() {
            return Ok(Tick::Terminated(SessionExit::Disconnected));
        }
        let settings = self.settings();

        let Some(current) = self.view.effective_render_size(&settings) else {
            return Ok(self.skip(self.timing.canvas_poll).await);
        };
        let size = match settings.mode() {
            ResolutionMode::Dynamic => ResolutionController::new(&settings, self.view.aspect_ratio)
                .adjust(current, self.render_time)
                .unwrap_or(current),
            ResolutionMode::Fixed { .. } => current,
        };
        if Some(size) != self.view.render {
            let render_ms = self.render_time.as_secs_f64() * 1000.0;
            debug!(session_id = %self.id, %size, render_ms, "session: resize");
        }
        self.view.render = Some(size);
        let padding = self.view.refresh_padding(&settings);

        let camera = match self.view.camera.as_ref().map(|c| c.resize(size.width, size.height)) {
            Some(Ok(camera)) => Some(camera),
            Some(Err(e)) => {
                warn!(session_id = %self.id, error = %e, "session: camera resize failed");
                None
            }
            None => None,
        };
        let request = RenderRequest {
            size,
            padding,
            frame_index: self.frames_published,
            camera,
            pointer: self.view.pointer,
            cursor: self.view.cursor_in_pixels(),
        };

        let renderer = Arc::clone(&self.renderer);
        let produced = match tokio::task::spawn_blocking(move || render_and_encode(renderer.as_ref(), &request)).await {
            Ok(result) => result?,
            Err(join_error) => return Err(SessionError::Panicked(join_error.to_string())),
        };

        match produced {
            Produced::Unsupported => return Ok(Tick::Terminated(SessionExit::Unsupported)),
            Produced::NoFrame => {
                self.render_time = Duration::ZERO;
                return Ok(self.skip(self.timing.no_frame_backoff).await);
            }
            Produced::Frame(frame) => {
                self.publisher.publish(self.target, frame).await;
                self.frames_published += 1;
            }
        }

        self.render_time = tick_start.elapsed();
        let interval = settings.frame_interval();
        if !self.pause(interval.saturating_sub(self.render_time)).await {
            return Ok(Tick::Terminated(SessionExit::Disconnected));
        }
        Ok(Tick::Published)
    }

    async fn skip(&mut self, backoff: Duration) -> Tick {
        if self.pause(backoff).await { Tick::Skipped } else { Tick::Terminated(SessionExit::Disconnected) }
    }

    fn settings(&self) -> StreamSettings {
        read_settings(&self.settings)
    }

    // --- Input ---

    /// Apply every queued event. Returns `false` once all handles are gone.
    fn drain_input(&mut self) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    /// Sleep for `duration` while still applying input. Returns `false` on
    /// disconnect.
    async fn pause(&mut self, duration: Duration) -> bool {
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => return true,
                event = self.input_rx.recv() => match event {
                    Some(event) => self.apply(event),
                    None => return false,
                },
            }
        }
    }

    fn apply(&mut self, event: InputEvent) {
        let settings = self.settings();
        match input::route(&mut self.view, &settings, event) {
            Ok(Navigation::None) => {}
            Ok(navigation) => debug!(session_id = %self.id, ?navigation, "session: navigate"),
            Err(e) => warn!(session_id = %self.id, error = %e, "session: input rejected"),
        }
    }
}

/// Render, check, pad, and encode. Runs on the blocking pool.
fn render_and_encode(renderer: &dyn Renderer, request: &RenderRequest) -> Result<Produced, SessionError> {
    match renderer.render(request)? {
        RenderOutcome::NoFrame => Ok(Produced::NoFrame),
        RenderOutcome::Unsupported => Ok(Produced::Unsupported),
        RenderOutcome::Frame(image) => {
            image.check_size(request.size)?;
            let frame = encode::encode_frame(&image, request.padding, JPEG_QUALITY)?;
            Ok(Produced::Frame(frame))
        }
    }
}
