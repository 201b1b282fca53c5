//! Frame sink seam and the connected-client registry that implements it.
//!
//! DESIGN
//! ======
//! Each websocket connection registers a bounded sender. Publishing is
//! fire-and-forget: a frame is offered with `try_send` and dropped for a
//! client whose queue is full, so a slow browser never stalls the render
//! loop that feeds it (or, in shared mode, its peers).

#[cfg(test)]
#[path = "publish_test.rs"]
mod publish_test;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::encode::EncodedFrame;

/// Outbound frame queue depth per client.
pub const CLIENT_QUEUE_CAPACITY: usize = 4;

/// Who receives a published frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishTarget {
    Client(Uuid),
    All,
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver `frame`. No acknowledgement, no error.
    async fn publish(&self, target: PublishTarget, frame: EncodedFrame);
}

/// Connected clients: `client_id` -> sender for outgoing frames.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<Uuid, mpsc::Sender<EncodedFrame>>>>,
}

impl ClientRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, client_id: Uuid, tx: mpsc::Sender<EncodedFrame>) {
        self.clients.write().await.insert(client_id, tx);
    }

    pub async fn unregister(&self, client_id: Uuid) {
        self.clients.write().await.remove(&client_id);
    }

    pub async fn count(&self) -> usize {
        self.clients.read().await.len()
    }
}

fn offer(client_id: Uuid, tx: &mpsc::Sender<EncodedFrame>, frame: EncodedFrame) {
    match tx.try_send(frame) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            debug!(%client_id, "publish: client queue full; dropping frame");
        }
        Err(TrySendError::Closed(_)) => {
            warn!(%client_id, "publish: client queue closed");
        }
    }
}

#[async_trait::async_trait]
impl Publisher for ClientRegistry {
    async fn publish(&self, target: PublishTarget, frame: EncodedFrame) {
        let clients = self.clients.read().await;
        match target {
            PublishTarget::Client(client_id) => {
                if let Some(tx) = clients.get(&client_id) {
                    offer(client_id, tx, frame);
                }
            }
            PublishTarget::All => {
                for (client_id, tx) in clients.iter() {
                    offer(*client_id, tx, frame.clone());
                }
            }
        }
    }
}
