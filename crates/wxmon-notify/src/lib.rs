//! Notification delivery boundary.
//!
//! The alert pipeline pushes through the [`DeliveryGateway`] trait and
//! never inspects connection-layer internals. The built-in adapter
//! ([`hub::ConnectionHub`]) backs the server's web-socket endpoint.
//!
//! Delivery is at-most-once and best-effort: a user without a live
//! connection is a logged no-op, not an error, and nothing is queued
//! for later.

pub mod hub;


use anyhow::Result;
use async_trait::async_trait;
use wxmon_common::types::{AlertPayload, SystemAlert};

/// Outbound push channel to connected clients.
#[async_trait]
pub trait DeliveryGateway: Send + Sync {
    /// Delivers an alert payload to every live connection of one user.
    ///
    /// Missing connections are not an error; the attempt is logged
    /// either way.
    ///
    /// # Errors
    ///
    /// Only on serialization failure or an adapter-internal fault,
    /// never on an absent recipient.
    async fn send(&self, user_id: i64, payload: &AlertPayload) -> Result<()>;

    /// Fans a system alert out to every connected client, regardless of
    /// user. Used by the administrator broadcast path only.
    async fn broadcast(&self, alert: &SystemAlert) -> Result<()>;

    /// Adapter name for logging (e.g. `"websocket"`).
    fn gateway_name(&self) -> &str;
}
