use crate::DeliveryGateway;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use wxmon_common::types::{AlertPayload, SystemAlert, SystemAlertPayload};

/// One registered web-socket connection.
struct Session {
    conn_id: u64,
    tx: mpsc::UnboundedSender<String>,
}

/// In-process registry of live client connections, keyed by user id.
///
/// A user may hold several connections (multiple tabs/devices); `send`
/// fans out to all of them. Closed connections are pruned lazily on the
/// next push to the same user.
#[derive(Default)]
pub struct ConnectionHub {
    next_conn_id: AtomicU64,
    sessions: Mutex<HashMap<i64, Vec<Session>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection for `user_id` and returns its id together
    /// with the receiving end the socket task should drain.
    pub fn register(&self, user_id: i64) -> (u64, mpsc::UnboundedReceiver<String>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions
            .entry(user_id)
            .or_default()
            .push(Session { conn_id, tx });
        tracing::info!(user_id, conn_id, "Client connected");
        (conn_id, rx)
    }

    /// Removes one connection. A no-op if it was already pruned.
    pub fn unregister(&self, user_id: i64, conn_id: u64) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = sessions.get_mut(&user_id) {
            list.retain(|s| s.conn_id != conn_id);
            if list.is_empty() {
                sessions.remove(&user_id);
            }
        }
        tracing::info!(user_id, conn_id, "Client disconnected");
    }

    /// Number of live connections across all users.
    pub fn connection_count(&self) -> usize {
        let sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        sessions.values().map(Vec::len).sum()
    }

    /// Pushes `text` to every connection of one user. Returns the number
    /// of connections that accepted the message.
    fn push_to_user(&self, user_id: i64, text: &str) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(list) = sessions.get_mut(&user_id) else {
            return 0;
        };
        list.retain(|s| s.tx.send(text.to_string()).is_ok());
        let delivered = list.len();
        if list.is_empty() {
            sessions.remove(&user_id);
        }
        delivered
    }

    /// Pushes `text` to every connection of every user.
    fn push_all(&self, text: &str) -> usize {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let mut delivered = 0;
        for list in sessions.values_mut() {
            list.retain(|s| s.tx.send(text.to_string()).is_ok());
            delivered += list.len();
        }
        sessions.retain(|_, list| !list.is_empty());
        delivered
    }
}

#[async_trait]
impl DeliveryGateway for ConnectionHub {
    async fn send(&self, user_id: i64, payload: &AlertPayload) -> Result<()> {
        let text = serde_json::to_string(payload)?;
        let delivered = self.push_to_user(user_id, &text);
        if delivered == 0 {
            tracing::debug!(user_id, kind = %payload.kind, "No live connection, notification dropped");
        } else {
            tracing::info!(user_id, kind = %payload.kind, delivered, "Alert notification pushed");
        }
        Ok(())
    }

    async fn broadcast(&self, alert: &SystemAlert) -> Result<()> {
        let payload = SystemAlertPayload::from(alert);
        let text = serde_json::to_string(&payload)?;
        let delivered = self.push_all(&text);
        tracing::info!(
            alert_id = alert.id,
            severity = %alert.severity,
            delivered,
            "System alert broadcast"
        );
        Ok(())
    }

    fn gateway_name(&self) -> &str {
        "websocket"
    }
}
