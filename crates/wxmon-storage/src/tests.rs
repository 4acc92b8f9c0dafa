use crate::store::AlertStore;
use chrono::{Duration, Utc};
use wxmon_alert::{LocationDirectory, RuleStore};
use wxmon_common::types::{
    CreateLocationRequest, CreateRuleRequest, CreateSystemAlertRequest, MetricKind, SystemSeverity,
    UpdateRuleRequest,
};

async fn memory_store() -> AlertStore {
    AlertStore::new("sqlite::memory:").await.unwrap()
}

async fn seed_location(store: &AlertStore, name: &str) -> i64 {
    store
        .create_location(&CreateLocationRequest {
            name: name.to_string(),
            region: None,
            country: "Vietnam".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn rule_request(user_id: i64, location_id: i64, metric: MetricKind, threshold: f64) -> CreateRuleRequest {
    CreateRuleRequest {
        user_id,
        location_id,
        metric,
        threshold,
        description: None,
        is_active: true,
    }
}

#[tokio::test]
async fn rule_round_trips_through_the_store() {
    let store = memory_store().await;
    let location_id = seed_location(&store, "Hà Nội").await;

    let mut req = rule_request(10, location_id, MetricKind::Aqi, 150.0);
    req.description = Some("ô nhiễm".to_string());
    let created = store.create_rule(&req).await.unwrap();

    let fetched = store.get_rule(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.metric, MetricKind::Aqi);
    assert_eq!(fetched.threshold, 150.0);
    assert_eq!(fetched.description.as_deref(), Some("ô nhiễm"));
    assert!(fetched.is_active);
}

#[tokio::test]
async fn list_active_rules_excludes_inactive() {
    let store = memory_store().await;
    let location_id = seed_location(&store, "Hà Nội").await;

    let mut inactive = rule_request(10, location_id, MetricKind::Rain, 5.0);
    inactive.is_active = false;
    store.create_rule(&inactive).await.unwrap();
    let active = store
        .create_rule(&rule_request(10, location_id, MetricKind::Wind, 40.0))
        .await
        .unwrap();

    let rules = store.list_active_rules().await.unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].id, active.id);
}

#[tokio::test]
async fn per_location_listing_scopes_to_user_and_location() {
    let store = memory_store().await;
    let hanoi = seed_location(&store, "Hà Nội").await;
    let hue = seed_location(&store, "Huế").await;

    store
        .create_rule(&rule_request(10, hanoi, MetricKind::TemperatureHigh, 35.0))
        .await
        .unwrap();
    store
        .create_rule(&rule_request(10, hue, MetricKind::TemperatureHigh, 35.0))
        .await
        .unwrap();
    store
        .create_rule(&rule_request(99, hanoi, MetricKind::TemperatureHigh, 35.0))
        .await
        .unwrap();

    let rules = store
        .list_active_rules_for_location(hanoi, 10)
        .await
        .unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].user_id, 10);
    assert_eq!(rules[0].location_id, hanoi);
}

#[tokio::test]
async fn update_is_owner_scoped() {
    let store = memory_store().await;
    let location_id = seed_location(&store, "Hà Nội").await;
    let rule = store
        .create_rule(&rule_request(10, location_id, MetricKind::Humidity, 90.0))
        .await
        .unwrap();

    let update = UpdateRuleRequest {
        threshold: Some(85.0),
        is_active: Some(false),
        description: None,
    };
    let updated = store.update_rule(rule.id, 10, &update).await.unwrap();
    assert_eq!(updated.threshold, 85.0);
    assert!(!updated.is_active);

    // Another user cannot touch the rule.
    assert!(store.update_rule(rule.id, 99, &update).await.is_err());
}

#[tokio::test]
async fn delete_is_owner_scoped() {
    let store = memory_store().await;
    let location_id = seed_location(&store, "Hà Nội").await;
    let rule = store
        .create_rule(&rule_request(10, location_id, MetricKind::Rain, 5.0))
        .await
        .unwrap();

    assert!(!store.delete_rule(rule.id, 99).await.unwrap());
    assert!(store.delete_rule(rule.id, 10).await.unwrap());
    assert!(store.get_rule(rule.id).await.unwrap().is_none());
}

#[tokio::test]
async fn directory_resolves_known_locations_only() {
    let store = memory_store().await;
    let id = seed_location(&store, "Đà Nẵng").await;

    assert_eq!(
        store.resolve_name(id).await.unwrap().as_deref(),
        Some("Đà Nẵng")
    );
    assert_eq!(store.resolve_name(id + 100).await.unwrap(), None);
}

#[tokio::test]
async fn system_alert_listing_filters_expired_and_inactive() {
    let store = memory_store().await;
    let now = Utc::now();

    let live = store
        .create_system_alert(&CreateSystemAlertRequest {
            title: "Bão số 3".into(),
            message: "Bão đổ bộ miền Trung trong 24h tới".into(),
            severity: SystemSeverity::Danger,
            location_id: None,
            expires_at: Some(now + Duration::hours(24)),
        })
        .await
        .unwrap();
    store
        .create_system_alert(&CreateSystemAlertRequest {
            title: "Đã hết hạn".into(),
            message: "x".into(),
            severity: SystemSeverity::Info,
            location_id: None,
            expires_at: Some(now - Duration::hours(1)),
        })
        .await
        .unwrap();
    let retired = store
        .create_system_alert(&CreateSystemAlertRequest {
            title: "Đã gỡ".into(),
            message: "y".into(),
            severity: SystemSeverity::Warning,
            location_id: None,
            expires_at: None,
        })
        .await
        .unwrap();
    store.deactivate_system_alert(retired.id).await.unwrap();

    let active = store.list_active_system_alerts(now).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, live.id);
    assert_eq!(active[0].severity, SystemSeverity::Danger);
}
