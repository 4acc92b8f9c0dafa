use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

/// Default minimum time between repeated notifications for the same rule.
pub const DEFAULT_COOLDOWN_SECS: u64 = 30 * 60;

/// In-memory map from rule id to last-trigger timestamp.
///
/// Bounds notification spam under a sustained threshold breach: a rule
/// that fired within the window must not fire again even if the
/// condition still holds. Entries are never evicted; the map is bounded
/// by the total rule count.
///
/// Not persisted. A process restart clears all cooldowns, so a restart
/// during a sustained breach causes at most one duplicate notification,
/// which beats risking silently suppressed alerts.
///
/// One instance is shared between the periodic loop and the on-demand
/// check path, so manual checks cannot be used to bypass the window.
pub struct CooldownTracker {
    window: Duration,
    last_fired: Mutex<HashMap<i64, DateTime<Utc>>>,
}

impl CooldownTracker {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window: Duration::seconds(window_secs as i64),
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    /// True iff the rule fired less than one window before `now`.
    pub fn should_suppress(&self, rule_id: i64, now: DateTime<Utc>) -> bool {
        let last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        last_fired
            .get(&rule_id)
            .is_some_and(|last| now - *last < self.window)
    }

    /// Marks the rule as having fired at `now`.
    pub fn record_trigger(&self, rule_id: i64, now: DateTime<Utc>) {
        let mut last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        last_fired.insert(rule_id, now);
    }

    /// Atomic check-and-set: returns true and records the trigger iff the
    /// rule is not currently suppressed.
    ///
    /// The scanner uses only this method. Two concurrent sweeps racing on
    /// the same rule resolve under one lock, so at most one of them wins
    /// the window.
    pub fn try_acquire(&self, rule_id: i64, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.last_fired.lock().unwrap_or_else(|e| e.into_inner());
        let suppressed = last_fired
            .get(&rule_id)
            .is_some_and(|last| now - *last < self.window);
        if suppressed {
            return false;
        }
        last_fired.insert(rule_id, now);
        true
    }
}
