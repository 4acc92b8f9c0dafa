use crate::state::AppState;
use crate::{api, logging, ws};
use axum::http::HeaderValue;
use axum::routing::get;
use axum::{middleware, Json, Router};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wxmon API",
        description = "Weather threshold alert monitoring REST API",
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Rules", description = "Alert rule management and on-demand checks"),
        (name = "Locations", description = "Monitored locations"),
        (name = "SystemAlerts", description = "Administrator broadcasts")
    )
)]
struct ApiDoc;

/// An empty allow-list means any origin; invalid entries are dropped
/// with a warning.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(val) => Some(val),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(origins)
}

pub fn build_http_app(state: AppState) -> Router {
    let (api_router, api_spec) = api::routes().split_for_parts();

    let mut merged_spec = ApiDoc::openapi();
    merged_spec.merge(api_spec);
    let spec_json = serde_json::to_value(&merged_spec).unwrap_or_default();

    let cors = cors_layer(&state.config.cors_allowed_origins);

    api_router
        .route("/v1/ws", get(ws::ws_handler))
        .with_state(state)
        .route(
            "/v1/openapi.json",
            get(move || {
                let spec = spec_json.clone();
                async move { Json(spec) }
            }),
        )
        .layer(cors)
        .layer(middleware::from_fn(logging::request_logging))
}
