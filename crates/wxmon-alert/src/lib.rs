//! Alert monitoring pipeline: rule evaluation, cooldown-based
//! deduplication, per-location sweeps, and the background monitor loop.
//!
//! One sweep loads every active rule, groups rules by location so the
//! weather provider is queried once per distinct location, evaluates each
//! rule against the fetched snapshot, and gates triggers through a shared
//! [`cooldown::CooldownTracker`]. The [`monitor::MonitorLoop`] drives
//! sweeps on a fixed interval and forwards triggered events to the
//! delivery gateway; nothing in here is fatal to the hosting process.

pub mod cooldown;
pub mod evaluator;
pub mod formatter;
pub mod monitor;
pub mod scanner;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use wxmon_common::types::AlertRule;

/// Read access to persisted alert rules.
///
/// Implementations must be safe to share across tasks (`Send + Sync`):
/// the periodic sweep and the on-demand check path read concurrently.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// All rules with the active flag set, across all users.
    async fn list_active_rules(&self) -> Result<Vec<AlertRule>>;

    /// Active rules of one user for one location (on-demand check path).
    async fn list_active_rules_for_location(
        &self,
        location_id: i64,
        user_id: i64,
    ) -> Result<Vec<AlertRule>>;
}

/// Resolves a location id to the display name that is also used as the
/// weather provider query key.
#[async_trait]
pub trait LocationDirectory: Send + Sync {
    /// `None` means the id is unknown; the location group is skipped for
    /// the sweep.
    async fn resolve_name(&self, location_id: i64) -> Result<Option<String>>;
}
