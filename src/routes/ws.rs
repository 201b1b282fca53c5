//! WebSocket handler: input in, frames out.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID, registers a bounded frame queue, and
//! attaches to a session. Then a `select!` loop:
//! - Incoming text messages -> parse -> forward input or apply settings
//! - Encoded frames from the session -> binary websocket messages
//!
//! Input is forwarded without a reply. Settings changes are answered with the
//! resulting settings, or with a structured error that leaves them unchanged.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade -> send `connected` with client, session, and settings
//! 2. Client sends `canvas_resized`; the session starts streaming
//! 3. Close -> unregister; a per-client session ends with its handle

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::encode::EncodedFrame;
use crate::protocol::{ClientMessage, ProtocolError, ServerMessage};
use crate::publish::CLIENT_QUEUE_CAPACITY;
use crate::session::SessionHandle;
use crate::state::AppState;

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    let (client_tx, mut client_rx) = mpsc::channel::<EncodedFrame>(CLIENT_QUEUE_CAPACITY);
    state.clients.register(client_id, client_tx).await;
    let attached = state.attach(client_id);
    let session = attached.handle;

    let welcome = ServerMessage::Connected {
        client_id,
        session_id: session.id(),
        shared: attached.shared,
        settings: session.settings(),
    };
    if send_message(&mut socket, &welcome).await.is_ok() {
        let clients = state.clients.count().await;
        info!(%client_id, session_id = %session.id(), shared = attached.shared, clients, "ws: client connected");
        relay(&mut socket, &session, client_id, &mut client_rx).await;
    }

    state.clients.unregister(client_id).await;
    info!(%client_id, "ws: client disconnected");
}

async fn relay(
    socket: &mut WebSocket,
    session: &SessionHandle,
    client_id: Uuid,
    client_rx: &mut mpsc::Receiver<EncodedFrame>,
) {
    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let reply = match msg {
                    Message::Text(text) => process_inbound_text(session, client_id, text.as_str()),
                    Message::Binary(_) => {
                        warn!(%client_id, "ws: unexpected binary message");
                        Some(ServerMessage::error_from(&ProtocolError::UnexpectedBinary))
                    }
                    Message::Close(_) => break,
                    Message::Ping(_) | Message::Pong(_) => None,
                };
                if let Some(reply) = reply {
                    if send_message(socket, &reply).await.is_err() {
                        break;
                    }
                }
            }
            Some(frame) = client_rx.recv() => {
                if socket.send(Message::Binary(frame.bytes)).await.is_err() {
                    break;
                }
            }
        }
    }
}

// =============================================================================
// INBOUND
// =============================================================================

/// Parse one text message and act on it. Returns the reply for the sender,
/// if any.
fn process_inbound_text(session: &SessionHandle, client_id: Uuid, text: &str) -> Option<ServerMessage> {
    let msg = match ClientMessage::parse(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound message");
            return Some(ServerMessage::error_from(&e));
        }
    };

    let result = match msg {
        ClientMessage::SetTargetFps { fps } => session.set_target_fps(fps),
        ClientMessage::SetDynamicResolution { min_pixel, max_pixel, adjustment_step } => {
            session.set_dynamic_resolution(min_pixel, max_pixel, adjustment_step)
        }
        ClientMessage::SetFixedResolution { width, height, force_fixed_aspect } => {
            session.set_fixed_resolution(width, height, force_fixed_aspect)
        }
        input => return forward_input(session, client_id, &input),
    };

    Some(match result {
        Ok(settings) => {
            info!(%client_id, ?settings, "ws: settings updated");
            ServerMessage::Settings { settings }
        }
        Err(e) => {
            warn!(%client_id, error = %e, "ws: settings rejected");
            ServerMessage::error_from(&e)
        }
    })
}

fn forward_input(session: &SessionHandle, client_id: Uuid, msg: &ClientMessage) -> Option<ServerMessage> {
    let event = msg.input_event()?;
    if session.send(event) {
        return None;
    }
    debug!(%client_id, "ws: input for ended session");
    Some(ServerMessage::error_from(&ProtocolError::SessionClosed))
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize message");
            return Err(());
        }
    };
    socket.send(Message::Text(json.into())).await.map_err(|e| {
        debug!(error = %e, "ws: send failed");
    })
}
