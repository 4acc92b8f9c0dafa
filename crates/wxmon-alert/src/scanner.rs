use crate::cooldown::CooldownTracker;
use crate::evaluator;
use crate::{LocationDirectory, RuleStore};
use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use wxmon_common::types::{AlertRule, TriggeredAlert, UnitSystem};
use wxmon_weather::WeatherProvider;

/// Orchestrates one evaluation sweep over active rules.
///
/// Rules are grouped by location so the provider is queried once per
/// distinct location, not once per rule. A provider or directory failure
/// for one location skips that group only; the sweep continues for the
/// rest. The only hard failure is the rule-store read, which propagates
/// to the caller.
pub struct AlertScanner {
    rule_store: Arc<dyn RuleStore>,
    locations: Arc<dyn LocationDirectory>,
    provider: Arc<dyn WeatherProvider>,
    cooldown: Arc<CooldownTracker>,
    units: UnitSystem,
}

impl AlertScanner {
    pub fn new(
        rule_store: Arc<dyn RuleStore>,
        locations: Arc<dyn LocationDirectory>,
        provider: Arc<dyn WeatherProvider>,
        cooldown: Arc<CooldownTracker>,
        units: UnitSystem,
    ) -> Self {
        Self {
            rule_store,
            locations,
            provider,
            cooldown,
            units,
        }
    }

    /// One full sweep. Idempotent per call; the cooldown tracker is the
    /// only cross-call state.
    ///
    /// # Errors
    ///
    /// Only when the rule store itself fails; per-location failures are
    /// logged and absorbed.
    pub async fn scan(&self) -> Result<Vec<TriggeredAlert>> {
        let rules = self.rule_store.list_active_rules().await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }

        let mut groups: HashMap<i64, Vec<AlertRule>> = HashMap::new();
        for rule in rules {
            groups.entry(rule.location_id).or_default().push(rule);
        }
        tracing::debug!(locations = groups.len(), "Starting alert sweep");

        let mut events = Vec::new();
        for (location_id, group) in groups {
            events.extend(self.check_group(location_id, &group).await);
        }
        Ok(events)
    }

    /// On-demand check of one user's active rules for one location, used
    /// outside the periodic loop (e.g. right after a forecast view).
    ///
    /// Shares the periodic loop's cooldown tracker, so repeated manual
    /// checks cannot bypass the window.
    pub async fn scan_location(
        &self,
        location_id: i64,
        user_id: i64,
    ) -> Result<Vec<TriggeredAlert>> {
        let rules = self
            .rule_store
            .list_active_rules_for_location(location_id, user_id)
            .await?;
        if rules.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.check_group(location_id, &rules).await)
    }

    /// Fetches one location's conditions and evaluates its rule group.
    /// Every failure here is absorbed: the group is skipped and the rest
    /// of the sweep is unaffected.
    async fn check_group(&self, location_id: i64, rules: &[AlertRule]) -> Vec<TriggeredAlert> {
        let city = match self.locations.resolve_name(location_id).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::warn!(location_id, "Unknown location, skipping rule group");
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!(location_id, error = %e, "Location lookup failed, skipping rule group");
                return Vec::new();
            }
        };

        let snapshot = match self.provider.fetch_current(&city, self.units).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(
                    location_id,
                    city = %city,
                    provider = self.provider.provider_name(),
                    error = %e,
                    "Weather fetch failed, skipping rule group"
                );
                return Vec::new();
            }
        };

        let now = Utc::now();
        let mut events = Vec::new();
        for rule in rules {
            if !rule.is_active {
                continue;
            }
            let evaluation = evaluator::evaluate(rule, &snapshot);
            let Some(observed) = evaluation.observed else {
                tracing::debug!(rule_id = rule.id, metric = %rule.metric, "Snapshot field missing, rule skipped");
                continue;
            };
            if !evaluation.triggered {
                continue;
            }
            if !self.cooldown.try_acquire(rule.id, now) {
                tracing::debug!(rule_id = rule.id, "Alert suppressed (cooldown window)");
                continue;
            }
            tracing::info!(
                rule_id = rule.id,
                user_id = rule.user_id,
                metric = %rule.metric,
                observed,
                threshold = rule.threshold,
                city = %city,
                "Alert rule triggered"
            );
            events.push(TriggeredAlert {
                rule: rule.clone(),
                observed,
                city: city.clone(),
                triggered_at: now,
            });
        }
        events
    }
}
