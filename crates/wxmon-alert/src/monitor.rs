use crate::formatter;
use crate::scanner::AlertScanner;
use anyhow::Result;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use wxmon_common::types::AlertPayload;
use wxmon_notify::DeliveryGateway;

/// Explicit loop state; `start()` while running and `stop()` while
/// stopped are both no-ops.
enum LoopState {
    Stopped,
    Running(JoinHandle<()>),
}

/// Owns the repeating sweep timer and the delivery of triggered events.
///
/// On `start()` the first sweep runs immediately (users should not wait
/// a full interval for first feedback), then every `check_interval`.
/// A failing sweep or delivery never prevents the next tick.
pub struct MonitorLoop {
    scanner: Arc<AlertScanner>,
    gateway: Arc<dyn DeliveryGateway>,
    check_interval: Duration,
    locale: String,
    state: Mutex<LoopState>,
}

impl MonitorLoop {
    pub fn new(
        scanner: Arc<AlertScanner>,
        gateway: Arc<dyn DeliveryGateway>,
        check_interval: Duration,
        locale: &str,
    ) -> Self {
        Self {
            scanner,
            gateway,
            check_interval,
            locale: locale.to_string(),
            state: Mutex::new(LoopState::Stopped),
        }
    }

    /// Spawns the background sweep task. Idempotent.
    pub fn start(self: &Arc<Self>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(*state, LoopState::Running(_)) {
            tracing::debug!("Monitor loop already running");
            return;
        }
        let this = Arc::clone(self);
        let handle = tokio::spawn(async move {
            // First tick of `interval` completes immediately.
            let mut tick = interval(this.check_interval);
            loop {
                tick.tick().await;
                if let Err(e) = this.run_tick().await {
                    tracing::error!(error = %e, "Alert sweep failed");
                }
            }
        });
        *state = LoopState::Running(handle);
        tracing::info!(
            interval_secs = self.check_interval.as_secs(),
            "Alert monitor started"
        );
    }

    /// Aborts the background task. Idempotent.
    pub fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let LoopState::Running(handle) = std::mem::replace(&mut *state, LoopState::Stopped) {
            handle.abort();
            tracing::info!("Alert monitor stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*state, LoopState::Running(_))
    }

    /// On-demand check of one location for one user; delivers to the
    /// user's live connections and returns the payloads for the HTTP
    /// response. Shares the periodic loop's cooldown tracker.
    pub async fn check_location(&self, location_id: i64, user_id: i64) -> Result<Vec<AlertPayload>> {
        let events = self.scanner.scan_location(location_id, user_id).await?;
        let mut payloads = Vec::with_capacity(events.len());
        for event in &events {
            let notification = formatter::format(event, &self.locale);
            let payload = formatter::payload(event, &notification);
            self.deliver(event.rule.user_id, &payload).await;
            payloads.push(payload);
        }
        Ok(payloads)
    }

    async fn run_tick(&self) -> Result<()> {
        let events = self.scanner.scan().await?;
        if events.is_empty() {
            return Ok(());
        }
        tracing::info!(count = events.len(), "Sweep produced triggered alerts");
        for event in &events {
            let notification = formatter::format(event, &self.locale);
            let payload = formatter::payload(event, &notification);
            self.deliver(event.rule.user_id, &payload).await;
        }
        Ok(())
    }

    async fn deliver(&self, user_id: i64, payload: &AlertPayload) {
        if let Err(e) = self.gateway.send(user_id, payload).await {
            tracing::error!(
                user_id,
                gateway = self.gateway.gateway_name(),
                error = %e,
                "Notification delivery failed"
            );
        }
    }
}

impl Drop for MonitorLoop {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let LoopState::Running(handle) = std::mem::replace(&mut *state, LoopState::Stopped) {
                handle.abort();
            }
        }
    }
}
