use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::time::Duration;
use tracing_subscriber::EnvFilter;

use wxmon_alert::cooldown::CooldownTracker;
use wxmon_alert::monitor::MonitorLoop;
use wxmon_alert::scanner::AlertScanner;
use wxmon_alert::{LocationDirectory, RuleStore};
use wxmon_notify::hub::ConnectionHub;
use wxmon_notify::DeliveryGateway;
use wxmon_server::app::build_http_app;
use wxmon_server::config::ServerConfig;
use wxmon_server::state::AppState;
use wxmon_storage::AlertStore;
use wxmon_weather::weatherapi::WeatherApiClient;
use wxmon_weather::WeatherProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wxmon=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/server.toml".to_string());
    let config = Arc::new(ServerConfig::load(&config_path)?);

    std::fs::create_dir_all(&config.database.data_dir)
        .with_context(|| format!("failed to create data dir: {}", config.database.data_dir))?;

    let store = Arc::new(AlertStore::new(&config.database.url).await?);
    let hub = Arc::new(ConnectionHub::new());

    let provider: Arc<dyn WeatherProvider> = Arc::new(WeatherApiClient::new(
        &config.weather.api_key,
        &config.weather.base_url,
        config.weather.timeout_secs,
    )?);

    let rule_store: Arc<dyn RuleStore> = store.clone();
    let locations: Arc<dyn LocationDirectory> = store.clone();
    let cooldown = Arc::new(CooldownTracker::new(config.monitor.cooldown_secs));
    let scanner = Arc::new(AlertScanner::new(
        rule_store,
        locations,
        provider,
        cooldown,
        config.monitor.units,
    ));

    let gateway: Arc<dyn DeliveryGateway> = hub.clone();
    let monitor = Arc::new(MonitorLoop::new(
        scanner,
        gateway,
        Duration::from_secs(config.monitor.check_interval_secs),
        &config.monitor.locale,
    ));
    monitor.start();

    let state = AppState {
        store,
        hub,
        monitor: monitor.clone(),
        config: config.clone(),
        start_time: Utc::now(),
    };
    let app = build_http_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    tracing::info!(%addr, "HTTP server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    monitor.stop();
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
