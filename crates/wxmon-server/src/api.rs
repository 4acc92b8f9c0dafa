use crate::logging::TraceId;
use crate::state::AppState;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use utoipa_axum::{router::OpenApiRouter, routes};
use wxmon_common::types::{
    AlertPayload, AlertRule, CreateLocationRequest, CreateRuleRequest, CreateSystemAlertRequest,
    Location, SystemAlert, UpdateRuleRequest,
};
use wxmon_notify::DeliveryGateway;
use wxmon_storage::error::StorageError;

/// API error response.
#[derive(Serialize, ToSchema)]
pub struct ApiError {
    /// Application error code.
    pub err_code: i32,
    /// Error message.
    pub err_msg: String,
    /// Trace ID for log correlation.
    pub trace_id: String,
}

/// Uniform API response envelope.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    /// Application error code (0 on success).
    pub err_code: i32,
    /// Error message ("success" on success).
    pub err_msg: String,
    /// Trace ID for log correlation.
    pub trace_id: String,
    /// Payload, present when the operation returns data.
    pub data: Option<T>,
}

pub fn success_response<T>(status: StatusCode, trace_id: &str, data: T) -> Response
where
    T: Serialize,
{
    (
        status,
        Json(ApiResponse {
            err_code: 0,
            err_msg: "success".to_string(),
            trace_id: trace_id.to_string(),
            data: Some(data),
        }),
    )
        .into_response()
}

pub fn success_empty_response(status: StatusCode, trace_id: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: 0,
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

fn to_custom_error_code(code: &str) -> i32 {
    match code {
        "bad_request" => 1001,
        "not_found" => 1004,
        "storage_error" => 1501,
        "internal_error" => 1500,
        _ => 1999,
    }
}

pub fn error_response(status: StatusCode, trace_id: &str, code: &str, msg: &str) -> Response {
    (
        status,
        Json(ApiResponse::<Value> {
            err_code: to_custom_error_code(code),
            err_msg: msg.to_string(),
            trace_id: trace_id.to_string(),
            data: None,
        }),
    )
        .into_response()
}

/// Map a storage failure onto the response envelope.
fn storage_error_response(trace_id: &str, err: StorageError) -> Response {
    match err {
        StorageError::NotFound { entity, id } => error_response(
            StatusCode::NOT_FOUND,
            trace_id,
            "not_found",
            &format!("{entity} {id} not found"),
        ),
        other => {
            tracing::error!(error = %other, "Storage operation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                trace_id,
                "storage_error",
                "Database error",
            )
        }
    }
}

#[derive(Deserialize, IntoParams)]
struct UserParams {
    /// Owner of the alert rules.
    user_id: i64,
}

#[derive(Deserialize, IntoParams)]
struct CheckParams {
    /// Location to check against the user's rules.
    location_id: i64,
    /// Owner of the rules to evaluate.
    user_id: i64,
}

/// Health check response.
#[derive(Serialize, ToSchema)]
struct HealthResponse {
    /// Service version.
    version: String,
    /// Uptime in seconds.
    uptime_secs: i64,
    /// Whether the background monitor loop is running.
    monitor_running: bool,
    /// Number of live WebSocket connections.
    connections: usize,
}

/// Service health and monitor status.
#[utoipa::path(
    get,
    path = "/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service health", body = HealthResponse)
    )
)]
async fn health(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let uptime = (Utc::now() - state.start_time).num_seconds();
    success_response(
        StatusCode::OK,
        &trace_id,
        HealthResponse {
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: uptime,
            monitor_running: state.monitor.is_running(),
            connections: state.hub.connection_count(),
        },
    )
}

/// List a user's alert rules, newest first.
#[utoipa::path(
    get,
    path = "/v1/rules",
    tag = "Rules",
    params(UserParams),
    responses(
        (status = 200, description = "Alert rules for the user", body = Vec<AlertRule>)
    )
)]
async fn list_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    match state.store.list_rules_for_user(params.user_id).await {
        Ok(rules) => success_response(StatusCode::OK, &trace_id, rules),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Create an alert rule.
#[utoipa::path(
    post,
    path = "/v1/rules",
    tag = "Rules",
    request_body = CreateRuleRequest,
    responses(
        (status = 201, description = "Rule created", body = AlertRule),
        (status = 400, description = "Invalid threshold or unknown location", body = ApiError)
    )
)]
async fn create_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateRuleRequest>,
) -> impl IntoResponse {
    if !req.threshold.is_finite() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "threshold must be a finite number",
        );
    }
    match state.store.get_location(req.location_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "bad_request",
                &format!("unknown location_id: {}", req.location_id),
            )
        }
        Err(e) => return storage_error_response(&trace_id, e),
    }
    match state.store.create_rule(&req).await {
        Ok(rule) => success_response(StatusCode::CREATED, &trace_id, rule),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Update fields of an existing rule. Only the owner may update it.
#[utoipa::path(
    put,
    path = "/v1/rules/{id}",
    tag = "Rules",
    params(
        ("id" = i64, Path, description = "Rule ID"),
        UserParams
    ),
    request_body = UpdateRuleRequest,
    responses(
        (status = 200, description = "Updated rule", body = AlertRule),
        (status = 404, description = "Rule not found or not owned by the user", body = ApiError)
    )
)]
async fn update_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserParams>,
    Json(req): Json<UpdateRuleRequest>,
) -> impl IntoResponse {
    if let Some(threshold) = req.threshold {
        if !threshold.is_finite() {
            return error_response(
                StatusCode::BAD_REQUEST,
                &trace_id,
                "bad_request",
                "threshold must be a finite number",
            );
        }
    }
    match state.store.update_rule(id, params.user_id, &req).await {
        Ok(rule) => success_response(StatusCode::OK, &trace_id, rule),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Delete a rule. Only the owner may delete it.
#[utoipa::path(
    delete,
    path = "/v1/rules/{id}",
    tag = "Rules",
    params(
        ("id" = i64, Path, description = "Rule ID"),
        UserParams
    ),
    responses(
        (status = 200, description = "Rule deleted"),
        (status = 404, description = "Rule not found or not owned by the user", body = ApiError)
    )
)]
async fn delete_rule(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<UserParams>,
) -> impl IntoResponse {
    match state.store.delete_rule(id, params.user_id).await {
        Ok(true) => success_empty_response(StatusCode::OK, &trace_id, "deleted"),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            &trace_id,
            "not_found",
            &format!("rule {id} not found"),
        ),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Run the user's rules for one location immediately.
///
/// Triggered alerts are pushed to the user's live connections exactly as
/// the background sweep would, and are also returned in the response.
/// Rules still inside their cooldown window do not fire.
#[utoipa::path(
    post,
    path = "/v1/rules/check",
    tag = "Rules",
    params(CheckParams),
    responses(
        (status = 200, description = "Alerts triggered by this check", body = Vec<AlertPayload>),
        (status = 404, description = "Unknown location", body = ApiError)
    )
)]
async fn check_rules(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> impl IntoResponse {
    match state.store.get_location(params.location_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return error_response(
                StatusCode::NOT_FOUND,
                &trace_id,
                "not_found",
                &format!("location {} not found", params.location_id),
            )
        }
        Err(e) => return storage_error_response(&trace_id, e),
    }
    match state
        .monitor
        .check_location(params.location_id, params.user_id)
        .await
    {
        Ok(alerts) => success_response(StatusCode::OK, &trace_id, alerts),
        Err(e) => {
            tracing::error!(error = %e, "On-demand check failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &trace_id,
                "internal_error",
                "Check failed",
            )
        }
    }
}

/// List all monitored locations, sorted by name.
#[utoipa::path(
    get,
    path = "/v1/locations",
    tag = "Locations",
    responses(
        (status = 200, description = "Known locations", body = Vec<Location>)
    )
)]
async fn list_locations(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.list_locations().await {
        Ok(locations) => success_response(StatusCode::OK, &trace_id, locations),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Register a location for monitoring.
#[utoipa::path(
    post,
    path = "/v1/locations",
    tag = "Locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = Location),
        (status = 400, description = "Empty name", body = ApiError)
    )
)]
async fn create_location(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateLocationRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "location name must not be empty",
        );
    }
    match state.store.create_location(&req).await {
        Ok(location) => success_response(StatusCode::CREATED, &trace_id, location),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// List system alerts that are active and not yet expired.
#[utoipa::path(
    get,
    path = "/v1/system-alerts",
    tag = "SystemAlerts",
    responses(
        (status = 200, description = "Live system alerts, newest first", body = Vec<SystemAlert>)
    )
)]
async fn list_system_alerts(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.list_active_system_alerts(Utc::now()).await {
        Ok(alerts) => success_response(StatusCode::OK, &trace_id, alerts),
        Err(e) => storage_error_response(&trace_id, e),
    }
}

/// Create a system alert and broadcast it to every connected client.
#[utoipa::path(
    post,
    path = "/v1/system-alerts",
    tag = "SystemAlerts",
    request_body = CreateSystemAlertRequest,
    responses(
        (status = 201, description = "System alert created and broadcast", body = SystemAlert),
        (status = 400, description = "Empty title or message", body = ApiError)
    )
)]
async fn create_system_alert(
    Extension(trace_id): Extension<TraceId>,
    State(state): State<AppState>,
    Json(req): Json<CreateSystemAlertRequest>,
) -> impl IntoResponse {
    if req.title.trim().is_empty() || req.message.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            &trace_id,
            "bad_request",
            "title and message must not be empty",
        );
    }
    let alert = match state.store.create_system_alert(&req).await {
        Ok(alert) => alert,
        Err(e) => return storage_error_response(&trace_id, e),
    };
    if let Err(e) = state.hub.broadcast(&alert).await {
        tracing::error!(error = %e, alert_id = alert.id, "System alert broadcast failed");
    }
    success_response(StatusCode::CREATED, &trace_id, alert)
}

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(list_rules, create_rule))
        .routes(routes!(update_rule, delete_rule))
        .routes(routes!(check_rules))
        .routes(routes!(list_locations, create_location))
        .routes(routes!(list_system_alerts, create_system_alert))
}
