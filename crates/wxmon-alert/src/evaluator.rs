use wxmon_common::types::{AlertRule, MetricKind, WeatherSnapshot};

/// Outcome of evaluating one rule against one snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub triggered: bool,
    /// The snapshot value the rule was compared against; `None` when the
    /// provider did not report the field.
    pub observed: Option<f64>,
}

impl Evaluation {
    const SKIPPED: Evaluation = Evaluation {
        triggered: false,
        observed: None,
    };
}

/// Pure threshold check: no I/O, no state, never fails.
///
/// A snapshot missing the field required by the rule's metric yields
/// `{triggered: false, observed: None}`; the rule is silently skipped
/// for the sweep. All comparisons are boundary-inclusive single-sample
/// crossings; the rule model has no memory of prior snapshots beyond
/// the cooldown gate.
pub fn evaluate(rule: &AlertRule, snapshot: &WeatherSnapshot) -> Evaluation {
    let Some(value) = rule.metric.observed(snapshot) else {
        return Evaluation::SKIPPED;
    };
    let triggered = match rule.metric {
        MetricKind::TemperatureLow => value <= rule.threshold,
        MetricKind::TemperatureHigh
        | MetricKind::Rain
        | MetricKind::Wind
        | MetricKind::Humidity
        | MetricKind::Aqi => value >= rule.threshold,
    };
    Evaluation {
        triggered,
        observed: Some(value),
    }
}
