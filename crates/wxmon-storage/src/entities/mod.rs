pub mod alert_rule;
pub mod location;
pub mod system_alert;
