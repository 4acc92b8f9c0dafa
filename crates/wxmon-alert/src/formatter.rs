use wxmon_common::i18n::TRANSLATIONS;
use wxmon_common::types::{AlertPayload, MetricKind, Severity, TriggeredAlert};

/// A formatted, user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
}

/// Builds the localized message and severity for a triggered alert.
///
/// Pure function: identical events yield byte-identical output. Severity
/// comes from the fixed per-metric mapping; the message template carries
/// the metric name, the observed value, and the configured threshold.
pub fn format(event: &TriggeredAlert, locale: &str) -> Notification {
    let kind = event.rule.metric;
    let template = TRANSLATIONS
        .get_template(locale, kind.template_key())
        .unwrap_or("{city}: {value} / {threshold}");
    let message = template
        .replace("{city}", &event.city)
        .replace("{value}", &render_value(kind, event.observed))
        .replace("{threshold}", &render_value(kind, event.rule.threshold));
    Notification {
        message,
        severity: kind.severity(),
    }
}

/// Assembles the wire payload for one delivery.
pub fn payload(event: &TriggeredAlert, notification: &Notification) -> AlertPayload {
    AlertPayload {
        kind: event.rule.metric,
        city: event.city.clone(),
        message: notification.message.clone(),
        severity: notification.severity,
        current_value: event.observed,
        threshold: event.rule.threshold,
        description: event.rule.description.clone(),
        timestamp: event.triggered_at,
    }
}

/// Continuous metrics are rounded to one decimal; the AQI is an index
/// and renders as an integer.
fn render_value(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::Aqi => format!("{value:.0}"),
        MetricKind::TemperatureHigh
        | MetricKind::TemperatureLow
        | MetricKind::Rain
        | MetricKind::Wind
        | MetricKind::Humidity => format!("{value:.1}"),
    }
}
