use std::sync::Arc;

use chrono::{DateTime, Utc};
use wxmon_alert::monitor::MonitorLoop;
use wxmon_notify::hub::ConnectionHub;
use wxmon_storage::AlertStore;

use crate::config::ServerConfig;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AlertStore>,
    pub hub: Arc<ConnectionHub>,
    pub monitor: Arc<MonitorLoop>,
    pub config: Arc<ServerConfig>,
    pub start_time: DateTime<Utc>,
}
