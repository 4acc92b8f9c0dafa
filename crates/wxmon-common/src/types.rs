use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unit system used when querying the weather provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnitSystem::Metric => write!(f, "metric"),
            UnitSystem::Imperial => write!(f, "imperial"),
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(format!("unknown unit system: {s}")),
        }
    }
}

/// Notification severity, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use wxmon_common::types::Severity;
///
/// let sev: Severity = "medium".parse().unwrap();
/// assert_eq!(sev, Severity::Medium);
/// assert_eq!(sev.to_string(), "medium");
/// assert!(Severity::High > Severity::Low);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// Severity of an administrator broadcast, distinct from the per-rule
/// notification severity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum SystemSeverity {
    Info,
    Warning,
    Danger,
    Critical,
}

impl std::fmt::Display for SystemSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SystemSeverity::Info => write!(f, "info"),
            SystemSeverity::Warning => write!(f, "warning"),
            SystemSeverity::Danger => write!(f, "danger"),
            SystemSeverity::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for SystemSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(SystemSeverity::Info),
            "warning" => Ok(SystemSeverity::Warning),
            "danger" => Ok(SystemSeverity::Danger),
            "critical" => Ok(SystemSeverity::Critical),
            _ => Err(format!("unknown system severity: {s}")),
        }
    }
}

/// The closed set of weather metrics a rule can watch.
///
/// Adding a variant is a compile-time-checked change: the evaluator,
/// formatter, and severity mapping all match exhaustively on this enum.
///
/// # Examples
///
/// ```
/// use wxmon_common::types::MetricKind;
///
/// let kind: MetricKind = "temperature_high".parse().unwrap();
/// assert_eq!(kind, MetricKind::TemperatureHigh);
/// assert_eq!(kind.to_string(), "temperature_high");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TemperatureHigh,
    TemperatureLow,
    Rain,
    Wind,
    Humidity,
    Aqi,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::TemperatureHigh,
        MetricKind::TemperatureLow,
        MetricKind::Rain,
        MetricKind::Wind,
        MetricKind::Humidity,
        MetricKind::Aqi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::TemperatureHigh => "temperature_high",
            MetricKind::TemperatureLow => "temperature_low",
            MetricKind::Rain => "rain",
            MetricKind::Wind => "wind",
            MetricKind::Humidity => "humidity",
            MetricKind::Aqi => "aqi",
        }
    }

    /// Fixed notification severity for alerts produced by this metric.
    pub fn severity(&self) -> Severity {
        match self {
            MetricKind::TemperatureHigh => Severity::High,
            MetricKind::TemperatureLow => Severity::Medium,
            MetricKind::Rain => Severity::Medium,
            MetricKind::Wind => Severity::High,
            MetricKind::Humidity => Severity::Low,
            MetricKind::Aqi => Severity::High,
        }
    }

    /// Extracts the snapshot field this metric compares against.
    /// `None` means the provider did not report the field and the rule
    /// cannot be evaluated for this sweep.
    pub fn observed(&self, snapshot: &WeatherSnapshot) -> Option<f64> {
        match self {
            MetricKind::TemperatureHigh | MetricKind::TemperatureLow => snapshot.temperature,
            MetricKind::Rain => snapshot.precipitation,
            MetricKind::Wind => snapshot.wind_speed,
            MetricKind::Humidity => snapshot.humidity,
            MetricKind::Aqi => snapshot.aqi,
        }
    }

    /// Display unit for the metric's threshold and observed value.
    pub fn unit(&self, units: UnitSystem) -> &'static str {
        match self {
            MetricKind::TemperatureHigh | MetricKind::TemperatureLow => match units {
                UnitSystem::Metric => "°C",
                UnitSystem::Imperial => "°F",
            },
            MetricKind::Rain => match units {
                UnitSystem::Metric => "mm",
                UnitSystem::Imperial => "in",
            },
            MetricKind::Wind => match units {
                UnitSystem::Metric => "km/h",
                UnitSystem::Imperial => "mph",
            },
            MetricKind::Humidity => "%",
            MetricKind::Aqi => "AQI",
        }
    }

    /// Translation key for the metric's display name.
    pub fn name_key(&self) -> &'static str {
        match self {
            MetricKind::TemperatureHigh => "metric.temperature_high",
            MetricKind::TemperatureLow => "metric.temperature_low",
            MetricKind::Rain => "metric.rain",
            MetricKind::Wind => "metric.wind",
            MetricKind::Humidity => "metric.humidity",
            MetricKind::Aqi => "metric.aqi",
        }
    }

    /// Translation key for the alert message template.
    pub fn template_key(&self) -> &'static str {
        match self {
            MetricKind::TemperatureHigh => "alert.temperature_high",
            MetricKind::TemperatureLow => "alert.temperature_low",
            MetricKind::Rain => "alert.rain",
            MetricKind::Wind => "alert.wind",
            MetricKind::Humidity => "alert.humidity",
            MetricKind::Aqi => "alert.aqi",
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "temperature_high" => Ok(MetricKind::TemperatureHigh),
            "temperature_low" => Ok(MetricKind::TemperatureLow),
            "rain" => Ok(MetricKind::Rain),
            "wind" => Ok(MetricKind::Wind),
            "humidity" => Ok(MetricKind::Humidity),
            "aqi" => Ok(MetricKind::Aqi),
            _ => Err(format!("unknown metric kind: {s}")),
        }
    }
}

/// A point-in-time weather reading for one location.
///
/// Every metric field is optional: the provider may omit any of them, and
/// rules whose field is absent are skipped for the sweep rather than
/// treated as an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Temperature in °C (metric) or °F (imperial).
    pub temperature: Option<f64>,
    /// Precipitation amount in mm or inches.
    pub precipitation: Option<f64>,
    /// Wind speed in km/h or mph.
    pub wind_speed: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Air quality index (US EPA scale).
    pub aqi: Option<f64>,
}

/// A user-configured threshold on one weather metric for one location.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AlertRule {
    pub id: i64,
    pub user_id: i64,
    pub location_id: i64,
    pub metric: MetricKind,
    /// Unit depends on `metric`: °C, mm, km/h, %, or index points.
    pub threshold: f64,
    /// Inactive rules are never evaluated.
    pub is_active: bool,
    /// Free text, passed through to the notification payload.
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Produced once per qualifying rule per sweep. Transient, never persisted;
/// the formatter derives the user-facing message and severity from it.
#[derive(Debug, Clone)]
pub struct TriggeredAlert {
    pub rule: AlertRule,
    pub observed: f64,
    /// Display name of the rule's location.
    pub city: String,
    pub triggered_at: DateTime<Utc>,
}

/// Wire payload for a per-user alert push.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlertPayload {
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub city: String,
    pub message: String,
    pub severity: Severity,
    pub current_value: f64,
    pub threshold: f64,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An administrator broadcast, persisted and fanned out to every connected
/// client without rule evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SystemAlert {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub severity: SystemSeverity,
    /// Optional target location; `None` means service-wide.
    pub location_id: Option<i64>,
    /// Alerts past this instant are no longer listed as active.
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl SystemAlert {
    /// Active flag set and not yet expired at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|exp| exp > now)
    }
}

/// Wire payload for the broadcast-to-all path.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemAlertPayload {
    /// Always `"system_alert"`, so clients can demux pushes by type.
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub message: String,
    pub severity: SystemSeverity,
    pub location_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
    pub timestamp: DateTime<Utc>,
}

impl From<&SystemAlert> for SystemAlertPayload {
    fn from(alert: &SystemAlert) -> Self {
        Self {
            kind: "system_alert".to_string(),
            title: alert.title.clone(),
            message: alert.message.clone(),
            severity: alert.severity,
            location_id: alert.location_id,
            expires_at: alert.expires_at,
            timestamp: alert.created_at,
        }
    }
}

/// A directory entry resolving a location id to its display/query name.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Location {
    pub id: i64,
    /// Human-readable name, also used as the provider query key.
    pub name: String,
    pub region: Option<String>,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

// ---- API request types ----

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateRuleRequest {
    pub user_id: i64,
    pub location_id: i64,
    pub metric: MetricKind,
    pub threshold: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct UpdateRuleRequest {
    pub threshold: Option<f64>,
    pub is_active: Option<bool>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateLocationRequest {
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreateSystemAlertRequest {
    pub title: String,
    pub message: String,
    pub severity: SystemSeverity,
    #[serde(default)]
    pub location_id: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_kind_round_trips_through_serde() {
        for kind in MetricKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
            let back: MetricKind = serde_json::from_str(&json).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn severity_mapping_is_fixed() {
        assert_eq!(MetricKind::TemperatureHigh.severity(), Severity::High);
        assert_eq!(MetricKind::TemperatureLow.severity(), Severity::Medium);
        assert_eq!(MetricKind::Rain.severity(), Severity::Medium);
        assert_eq!(MetricKind::Wind.severity(), Severity::High);
        assert_eq!(MetricKind::Humidity.severity(), Severity::Low);
        assert_eq!(MetricKind::Aqi.severity(), Severity::High);
    }

    #[test]
    fn payload_serializes_camel_case_with_type_tag() {
        let payload = AlertPayload {
            kind: MetricKind::Rain,
            city: "Đà Nẵng".into(),
            message: "mưa lớn".into(),
            severity: Severity::Medium,
            current_value: 7.2,
            threshold: 5.0,
            description: None,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "rain");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["currentValue"], 7.2);
        assert!(json.get("current_value").is_none());
    }

    #[test]
    fn system_alert_liveness_respects_expiry() {
        let now = Utc::now();
        let mut alert = SystemAlert {
            id: 1,
            title: "Bão số 3".into(),
            message: "Bão đổ bộ miền Trung".into(),
            severity: SystemSeverity::Danger,
            location_id: None,
            expires_at: Some(now + chrono::Duration::hours(6)),
            is_active: true,
            created_at: now,
        };
        assert!(alert.is_live(now));
        assert!(!alert.is_live(now + chrono::Duration::hours(7)));

        alert.expires_at = None;
        assert!(alert.is_live(now + chrono::Duration::days(365)));

        alert.is_active = false;
        assert!(!alert.is_live(now));
    }
}
