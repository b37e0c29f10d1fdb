use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use super::messages::{CloseCode, Outbound};

/// Exclusively-owned sender half of one live connection
///
/// The writer task on the other end owns the socket sink; dropping every
/// clone of the handle ends it.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    conn_id: Uuid,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            tx,
        }
    }

    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// Queue a text frame; false means the connection is gone
    pub async fn send_text(&self, text: &str) -> bool {
        self.tx.send(Outbound::Text(text.to_string())).await.is_ok()
    }

    /// Ask the writer task to close the transport, best-effort
    pub async fn close(&self, code: CloseCode) {
        let _ = self.tx.send(Outbound::Close(code)).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    /// A previous connection held this chat id and was closed
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// No live session under the id, or it vanished mid-send
    Absent,
}

/// Directory of active chat sessions keyed by chat id
///
/// At most one live handle per key: registering over an existing entry
/// closes the superseded connection. The lock is held only for map access,
/// never across a channel send.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, ConnectionHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, chat_id: &str, handle: ConnectionHandle) -> RegisterOutcome {
        let previous = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(chat_id.to_string(), handle)
        };

        match previous {
            Some(old) => {
                info!("replacing live session for chat {}", chat_id);
                old.close(CloseCode::Superseded).await;
                RegisterOutcome::Replaced
            }
            None => {
                debug!("registered session for chat {}", chat_id);
                RegisterOutcome::Registered
            }
        }
    }

    /// Remove the entry for `chat_id` if it still belongs to `conn_id`
    ///
    /// The guard keeps a superseded loop's cleanup from evicting the
    /// connection that replaced it. Idempotent.
    pub async fn unregister(&self, chat_id: &str, conn_id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if sessions.get(chat_id).map(|h| h.conn_id()) == Some(conn_id) {
            sessions.remove(chat_id);
            debug!("unregistered session for chat {}", chat_id);
        }
    }

    pub async fn lookup(&self, chat_id: &str) -> Option<ConnectionHandle> {
        self.sessions.read().await.get(chat_id).cloned()
    }

    /// Deliver a text frame to the session for `chat_id`, best-effort
    ///
    /// A session that disconnected between lookup and send reports as
    /// absent rather than an error.
    pub async fn send(&self, chat_id: &str, text: &str) -> SendOutcome {
        let handle = { self.sessions.read().await.get(chat_id).cloned() };

        match handle {
            Some(handle) => {
                if handle.send_text(text).await {
                    SendOutcome::Sent
                } else {
                    SendOutcome::Absent
                }
            }
            None => SendOutcome::Absent,
        }
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
