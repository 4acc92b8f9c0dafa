use crate::cooldown::{CooldownTracker, DEFAULT_COOLDOWN_SECS};
use crate::evaluator;
use crate::formatter;
use crate::monitor::MonitorLoop;
use crate::scanner::AlertScanner;
use crate::{LocationDirectory, RuleStore};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use wxmon_common::types::{
    AlertPayload, AlertRule, MetricKind, Severity, SystemAlert, TriggeredAlert, UnitSystem,
    WeatherSnapshot,
};
use wxmon_notify::DeliveryGateway;
use wxmon_weather::error::{self, WeatherProviderError};
use wxmon_weather::WeatherProvider;

fn make_rule(id: i64, location_id: i64, metric: MetricKind, threshold: f64) -> AlertRule {
    let now = Utc::now();
    AlertRule {
        id,
        user_id: 10,
        location_id,
        metric,
        threshold,
        is_active: true,
        description: None,
        created_at: now,
        updated_at: now,
    }
}

fn make_event(metric: MetricKind, threshold: f64, observed: f64, city: &str) -> TriggeredAlert {
    TriggeredAlert {
        rule: make_rule(1, 42, metric, threshold),
        observed,
        city: city.to_string(),
        triggered_at: Utc::now(),
    }
}

// ---- Mock collaborators ----

struct StaticRuleStore {
    rules: Vec<AlertRule>,
    fail: bool,
}

impl StaticRuleStore {
    fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules, fail: false }
    }

    fn failing() -> Self {
        Self {
            rules: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl RuleStore for StaticRuleStore {
    async fn list_active_rules(&self) -> Result<Vec<AlertRule>> {
        if self.fail {
            return Err(anyhow!("rule store unavailable"));
        }
        Ok(self.rules.clone())
    }

    async fn list_active_rules_for_location(
        &self,
        location_id: i64,
        user_id: i64,
    ) -> Result<Vec<AlertRule>> {
        if self.fail {
            return Err(anyhow!("rule store unavailable"));
        }
        Ok(self
            .rules
            .iter()
            .filter(|r| r.location_id == location_id && r.user_id == user_id)
            .cloned()
            .collect())
    }
}

struct StaticDirectory {
    names: HashMap<i64, String>,
}

impl StaticDirectory {
    fn single(location_id: i64, name: &str) -> Self {
        Self {
            names: HashMap::from([(location_id, name.to_string())]),
        }
    }
}

#[async_trait]
impl LocationDirectory for StaticDirectory {
    async fn resolve_name(&self, location_id: i64) -> Result<Option<String>> {
        Ok(self.names.get(&location_id).cloned())
    }
}

struct MockProvider {
    snapshots: HashMap<String, WeatherSnapshot>,
    failing_cities: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn new(snapshots: HashMap<String, WeatherSnapshot>) -> Self {
        Self {
            snapshots,
            failing_cities: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for MockProvider {
    async fn fetch_current(
        &self,
        location_name: &str,
        _units: UnitSystem,
    ) -> error::Result<WeatherSnapshot> {
        self.calls.lock().unwrap().push(location_name.to_string());
        if self.failing_cities.contains(location_name) {
            return Err(WeatherProviderError::RateLimited);
        }
        self.snapshots
            .get(location_name)
            .cloned()
            .ok_or_else(|| WeatherProviderError::UnknownLocation(location_name.to_string()))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(i64, AlertPayload)>>,
}

impl RecordingGateway {
    fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl DeliveryGateway for RecordingGateway {
    async fn send(&self, user_id: i64, payload: &AlertPayload) -> Result<()> {
        self.sent.lock().unwrap().push((user_id, payload.clone()));
        Ok(())
    }

    async fn broadcast(&self, _alert: &SystemAlert) -> Result<()> {
        Ok(())
    }

    fn gateway_name(&self) -> &str {
        "recording"
    }
}

fn build_scanner(
    store: StaticRuleStore,
    directory: StaticDirectory,
    provider: Arc<MockProvider>,
    cooldown: Arc<CooldownTracker>,
) -> AlertScanner {
    AlertScanner::new(
        Arc::new(store),
        Arc::new(directory),
        provider,
        cooldown,
        UnitSystem::Metric,
    )
}

fn snapshot(temperature: f64) -> WeatherSnapshot {
    WeatherSnapshot {
        temperature: Some(temperature),
        ..Default::default()
    }
}

// ---- Evaluator ----

#[test]
fn temperature_high_boundary_is_inclusive() {
    let rule = make_rule(1, 42, MetricKind::TemperatureHigh, 35.0);
    assert!(evaluator::evaluate(&rule, &snapshot(35.0)).triggered);
    assert!(!evaluator::evaluate(&rule, &snapshot(34.99)).triggered);
}

#[test]
fn temperature_low_boundary_is_inclusive() {
    let rule = make_rule(1, 42, MetricKind::TemperatureLow, 10.0);
    assert!(evaluator::evaluate(&rule, &snapshot(10.0)).triggered);
    assert!(!evaluator::evaluate(&rule, &snapshot(10.01)).triggered);
}

#[test]
fn missing_field_means_cannot_evaluate() {
    let rule = make_rule(1, 42, MetricKind::Aqi, 100.0);
    let result = evaluator::evaluate(&rule, &snapshot(40.0));
    assert!(!result.triggered);
    assert_eq!(result.observed, None);
}

#[test]
fn rain_rule_reports_observed_value() {
    let rule = make_rule(1, 42, MetricKind::Rain, 5.0);
    let snap = WeatherSnapshot {
        precipitation: Some(7.2),
        ..Default::default()
    };
    let result = evaluator::evaluate(&rule, &snap);
    assert!(result.triggered);
    assert_eq!(result.observed, Some(7.2));
}

// ---- Formatter ----

#[test]
fn rain_message_contains_value_and_threshold() {
    let event = make_event(MetricKind::Rain, 5.0, 7.2, "Đà Nẵng");
    let notification = formatter::format(&event, "vi");
    assert!(notification.message.contains("7.2"), "{}", notification.message);
    assert!(notification.message.contains("5"), "{}", notification.message);
    assert!(notification.message.contains("Đà Nẵng"));
    assert_eq!(notification.severity, Severity::Medium);
}

#[test]
fn formatter_is_pure() {
    let event = make_event(MetricKind::Wind, 40.0, 52.3, "Hải Phòng");
    let first = formatter::format(&event, "vi");
    let second = formatter::format(&event, "vi");
    assert_eq!(first, second);
}

#[test]
fn formatter_localizes_per_locale() {
    let event = make_event(MetricKind::TemperatureHigh, 35.0, 37.0, "Hà Nội");
    let vi = formatter::format(&event, "vi");
    let en = formatter::format(&event, "en");
    assert_ne!(vi.message, en.message);
    assert!(en.message.contains("Heat alert"));
    assert_eq!(vi.severity, en.severity);
}

#[test]
fn aqi_value_renders_as_integer() {
    let event = make_event(MetricKind::Aqi, 3.0, 4.0, "Hà Nội");
    let notification = formatter::format(&event, "en");
    assert!(notification.message.contains("AQI is 4,"), "{}", notification.message);
}

#[test]
fn payload_carries_event_fields() {
    let mut event = make_event(MetricKind::Humidity, 90.0, 93.5, "Cần Thơ");
    event.rule.description = Some("phơi đồ".into());
    let notification = formatter::format(&event, "vi");
    let payload = formatter::payload(&event, &notification);
    assert_eq!(payload.kind, MetricKind::Humidity);
    assert_eq!(payload.city, "Cần Thơ");
    assert_eq!(payload.current_value, 93.5);
    assert_eq!(payload.threshold, 90.0);
    assert_eq!(payload.severity, Severity::Low);
    assert_eq!(payload.description.as_deref(), Some("phơi đồ"));
    assert_eq!(payload.timestamp, event.triggered_at);
}

// ---- Cooldown ----

#[test]
fn cooldown_suppresses_within_window_only() {
    let tracker = CooldownTracker::new(DEFAULT_COOLDOWN_SECS);
    let t0 = Utc::now();
    tracker.record_trigger(7, t0);

    assert!(tracker.should_suppress(7, t0 + Duration::minutes(10)));
    assert!(!tracker.should_suppress(7, t0 + Duration::minutes(31)));
    assert!(!tracker.should_suppress(8, t0), "other rules unaffected");
}

#[test]
fn try_acquire_is_check_and_set() {
    let tracker = CooldownTracker::new(DEFAULT_COOLDOWN_SECS);
    let t0 = Utc::now();

    assert!(tracker.try_acquire(7, t0));
    assert!(!tracker.try_acquire(7, t0 + Duration::minutes(10)));
    assert!(tracker.try_acquire(7, t0 + Duration::minutes(31)));
}

// ---- Scanner ----

#[tokio::test]
async fn inactive_rules_never_trigger() {
    let mut rule = make_rule(1, 42, MetricKind::TemperatureHigh, 30.0);
    rule.is_active = false;
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snapshot(40.0),
    )])));
    let scanner = build_scanner(
        StaticRuleStore::new(vec![rule]),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    let events = scanner.scan().await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn provider_failure_is_isolated_per_location() {
    let rules = vec![
        make_rule(1, 1, MetricKind::TemperatureHigh, 30.0),
        make_rule(2, 2, MetricKind::TemperatureHigh, 30.0),
    ];
    let mut provider = MockProvider::new(HashMap::from([("Huế".to_string(), snapshot(36.0))]));
    provider.failing_cities.insert("Vinh".to_string());

    let directory = StaticDirectory {
        names: HashMap::from([(1, "Vinh".to_string()), (2, "Huế".to_string())]),
    };
    let scanner = build_scanner(
        StaticRuleStore::new(rules),
        directory,
        Arc::new(provider),
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    let events = scanner.scan().await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].rule.id, 2);
    assert_eq!(events[0].city, "Huế");
}

#[tokio::test]
async fn one_provider_call_per_location_group() {
    let rules = vec![
        make_rule(1, 42, MetricKind::Wind, 40.0),
        make_rule(2, 42, MetricKind::Humidity, 90.0),
    ];
    let snap = WeatherSnapshot {
        wind_speed: Some(45.0),
        humidity: Some(60.0),
        ..Default::default()
    };
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snap,
    )])));
    let scanner = build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        Arc::clone(&provider),
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    let events = scanner.scan().await.unwrap();
    assert_eq!(events.len(), 1, "only the wind rule breaches");
    assert_eq!(events[0].rule.metric, MetricKind::Wind);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn unknown_location_skips_group_without_provider_call() {
    let rules = vec![make_rule(1, 99, MetricKind::Rain, 5.0)];
    let provider = Arc::new(MockProvider::new(HashMap::new()));
    let scanner = build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        Arc::clone(&provider),
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    let events = scanner.scan().await.unwrap();
    assert!(events.is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn rule_store_failure_propagates() {
    let provider = Arc::new(MockProvider::new(HashMap::new()));
    let scanner = build_scanner(
        StaticRuleStore::failing(),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    assert!(scanner.scan().await.is_err());
}

#[tokio::test]
async fn second_sweep_within_cooldown_is_suppressed() {
    let rules = vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0)];
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snapshot(40.0),
    )])));
    let scanner = build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    assert_eq!(scanner.scan().await.unwrap().len(), 1);
    // Condition still holds, but the window has not elapsed.
    assert_eq!(scanner.scan().await.unwrap().len(), 0);
}

#[tokio::test]
async fn concurrent_sweep_and_manual_check_emit_at_most_one() {
    let rules = vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0)];
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snapshot(40.0),
    )])));
    let scanner = Arc::new(build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    ));

    let periodic = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move { scanner.scan().await.unwrap().len() })
    };
    let manual = {
        let scanner = Arc::clone(&scanner);
        tokio::spawn(async move { scanner.scan_location(42, 10).await.unwrap().len() })
    };

    let total = periodic.await.unwrap() + manual.await.unwrap();
    assert_eq!(total, 1, "same breach must fire exactly once");
}

#[tokio::test]
async fn manual_check_scopes_to_user_and_location() {
    let mut other_user = make_rule(2, 42, MetricKind::TemperatureHigh, 30.0);
    other_user.user_id = 99;
    let rules = vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0), other_user];
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snapshot(40.0),
    )])));
    let scanner = build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    );

    let events = scanner.scan_location(42, 10).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].rule.id, 1);
}

// ---- Monitor loop ----

fn build_monitor(
    rules: Vec<AlertRule>,
    gateway: Arc<RecordingGateway>,
    interval_secs: u64,
) -> Arc<MonitorLoop> {
    let provider = Arc::new(MockProvider::new(HashMap::from([(
        "Hà Nội".to_string(),
        snapshot(40.0),
    )])));
    let scanner = Arc::new(build_scanner(
        StaticRuleStore::new(rules),
        StaticDirectory::single(42, "Hà Nội"),
        provider,
        Arc::new(CooldownTracker::new(DEFAULT_COOLDOWN_SECS)),
    ));
    Arc::new(MonitorLoop::new(
        scanner,
        gateway,
        tokio::time::Duration::from_secs(interval_secs),
        "vi",
    ))
}

#[tokio::test(start_paused = true)]
async fn first_sweep_runs_immediately_and_cooldown_gates_the_next() {
    let gateway = Arc::new(RecordingGateway::default());
    let monitor = build_monitor(
        vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0)],
        Arc::clone(&gateway),
        300,
    );

    monitor.start();
    tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    assert_eq!(gateway.sent_count(), 1, "immediate first sweep delivers");

    // Next tick fires well inside the 30-minute cooldown window.
    tokio::time::sleep(tokio::time::Duration::from_secs(301)).await;
    assert_eq!(gateway.sent_count(), 1, "re-trigger suppressed by cooldown");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_are_idempotent() {
    let gateway = Arc::new(RecordingGateway::default());
    let monitor = build_monitor(Vec::new(), gateway, 300);

    assert!(!monitor.is_running());
    monitor.start();
    monitor.start();
    assert!(monitor.is_running());

    monitor.stop();
    assert!(!monitor.is_running());
    monitor.stop();
    assert!(!monitor.is_running());
}

#[tokio::test(start_paused = true)]
async fn stopped_loop_delivers_nothing_further() {
    let gateway = Arc::new(RecordingGateway::default());
    let monitor = build_monitor(
        vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0)],
        Arc::clone(&gateway),
        300,
    );

    monitor.start();
    tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    monitor.stop();

    let before = gateway.sent_count();
    tokio::time::sleep(tokio::time::Duration::from_secs(3600)).await;
    assert_eq!(gateway.sent_count(), before);
}

#[tokio::test]
async fn on_demand_check_returns_and_delivers_payloads() {
    let gateway = Arc::new(RecordingGateway::default());
    let monitor = build_monitor(
        vec![make_rule(1, 42, MetricKind::TemperatureHigh, 30.0)],
        Arc::clone(&gateway),
        300,
    );

    let payloads = monitor.check_location(42, 10).await.unwrap();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].kind, MetricKind::TemperatureHigh);
    assert_eq!(gateway.sent_count(), 1);

    // Second manual check cannot bypass the shared cooldown.
    let repeat = monitor.check_location(42, 10).await.unwrap();
    assert!(repeat.is_empty());
    assert_eq!(gateway.sent_count(), 1);
}
