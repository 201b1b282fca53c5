//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the connected-client registry, the renderer every session draws
//! with, and the template new sessions are built from. In shared mode it
//! also holds the handle of the one session all connections attach to; that
//! handle keeps the shared loop alive for the life of the server.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::config::SessionTemplate;
use crate::publish::{ClientRegistry, PublishTarget, Publisher};
use crate::render::Renderer;
use crate::session::{self, SessionHandle};

/// A connection's view of the session it drives.
pub struct Attached {
    pub handle: SessionHandle,
    pub shared: bool,
}

/// Shared application state. Clone is required by Axum; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub clients: ClientRegistry,
    pub renderer: Arc<dyn Renderer>,
    pub template: Arc<SessionTemplate>,
    pub shared: Option<SessionHandle>,
}

impl AppState {
    /// Build the state. With `shared_session` set, the shared loop is spawned
    /// here, so this must run inside a Tokio runtime.
    #[must_use]
    pub fn new(renderer: Arc<dyn Renderer>, template: SessionTemplate, shared_session: bool) -> Self {
        let clients = ClientRegistry::new();
        let shared = shared_session.then(|| {
            let (handle, _task) =
                session::spawn(&template, PublishTarget::All, Arc::clone(&renderer), Arc::new(clients.clone()));
            handle
        });
        Self { clients, renderer, template: Arc::new(template), shared }
    }

    /// Session for a new connection: the shared one, or a fresh loop that
    /// publishes to `client_id` only and ends when the returned handle drops.
    #[must_use]
    pub fn attach(&self, client_id: Uuid) -> Attached {
        if let Some(handle) = &self.shared {
            if handle.is_closed() {
                warn!(%client_id, session_id = %handle.id(), "state: shared session has ended");
            }
            return Attached { handle: handle.clone(), shared: true };
        }
        let publisher: Arc<dyn Publisher> = Arc::new(self.clients.clone());
        let (handle, _task) =
            session::spawn(&self.template, PublishTarget::Client(client_id), Arc::clone(&self.renderer), publisher);
        Attached { handle, shared: false }
    }
}
