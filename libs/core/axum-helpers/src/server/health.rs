use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{DateTime, Utc};
use core_config::AppInfo;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// Snapshot of named components reported alongside liveness, e.g. `email`.
pub type ComponentStatus = Arc<dyn Fn() -> Map<String, Value> + Send + Sync>;

#[derive(Serialize)]
pub struct HealthResponse {
    pub success: bool,
    pub message: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    #[serde(flatten)]
    pub components: Map<String, Value>,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
}

#[derive(Clone)]
struct HealthState {
    app: AppInfo,
    started_at: Instant,
    components: ComponentStatus,
}

/// Health check endpoint handler.
///
/// Always 200 while the process serves requests. Component states are
/// informational only.
async fn health_handler(State(state): State<HealthState>) -> Response {
    let response = HealthResponse {
        success: true,
        message: "Server is healthy",
        name: state.app.name,
        version: state.app.version,
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        components: (state.components)(),
    };

    (StatusCode::OK, Json(response)).into_response()
}

async fn ready_handler() -> Json<ReadyResponse> {
    Json(ReadyResponse { ready: true })
}

/// Creates a router with the `/health` and `/ready` endpoints.
///
/// # Example
/// ```ignore
/// use axum_helpers::server::health_router;
/// use core_config::app_info;
///
/// let email = state.email.clone();
/// let app = Router::new().merge(health_router(
///     app_info!(),
///     Arc::new(move || Map::from_iter([("email".to_string(), json!(email.state()))])),
/// ));
/// ```
pub fn health_router(app_info: AppInfo, components: ComponentStatus) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(HealthState {
            app: app_info,
            started_at: Instant::now(),
            components,
        })
}
