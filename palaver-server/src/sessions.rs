//! Session registry for tracking logged-in connections
//!
//! The presence source of truth: one entry per identity that has sent a
//! `login` on a still-open connection. Entries are created by `login` and
//! removed only by connection teardown; an explicit `logout` message is
//! announced but leaves the entry in place.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use palaver_common::protocol::Message;

/// A logged-in identity's live connection handle
#[derive(Debug, Clone)]
pub struct Session {
    /// Identity declared in the login message
    pub user_id: String,
    /// Channel draining into the connection's write half
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Manages all logged-in sessions
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an identity
    ///
    /// Identities are assumed unique among currently-connected users; a
    /// duplicate login replaces the previous handle, and the replaced
    /// connection stays open but no longer receives routed traffic.
    pub async fn add(&self, user_id: &str, tx: mpsc::UnboundedSender<Message>) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            user_id.to_string(),
            Session {
                user_id: user_id.to_string(),
                tx,
            },
        );
    }

    /// Remove an identity on connection teardown
    ///
    /// Returns `true` if an entry was removed.
    pub async fn remove(&self, user_id: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        sessions.remove(user_id).is_some()
    }

    /// Whether an identity is currently registered
    pub async fn contains(&self, user_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions.contains_key(user_id)
    }

    /// Snapshot of currently-registered identities
    pub async fn user_ids(&self) -> Vec<String> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    /// Deliver a message to a single identity
    ///
    /// An unknown identity is a silent no-op; a closed channel is logged and
    /// otherwise ignored. The sender is never told either way.
    pub async fn send_to(&self, user_id: &str, message: Message) {
        let sessions = self.sessions.read().await;
        if let Some(session) = sessions.get(user_id)
            && session.tx.send(message).is_err()
        {
            eprintln!("Send to '{}' failed: channel closed", user_id);
        }
    }

    /// Deliver a message to every session except `except`
    ///
    /// Each send is independent: one recipient's closed channel is logged
    /// and skipped, never aborting delivery to the rest.
    pub async fn broadcast(&self, message: &Message, except: &str) {
        let sessions = self.sessions.read().await;
        for session in sessions.values() {
            if session.user_id == except {
                continue;
            }
            if session.tx.send(message.clone()).is_err() {
                eprintln!("Broadcast to '{}' failed: channel closed", session.user_id);
            }
        }
    }
}
