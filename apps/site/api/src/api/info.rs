//! API discovery endpoint

use axum::{Json, extract::State};
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::state::AppState;

pub const API_TITLE: &str = "AI Consult API";

#[derive(Serialize, ToSchema)]
pub struct ApiInfo {
    #[schema(value_type = String)]
    pub message: &'static str,
    #[schema(value_type = String)]
    pub version: &'static str,
    #[schema(value_type = Object)]
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Describe the API
#[utoipa::path(
    get,
    path = "/api",
    tag = "Meta",
    responses(
        (status = 200, description = "API name, version and endpoints", body = ApiInfo)
    )
)]
pub async fn api_info(State(state): State<AppState>) -> Json<ApiInfo> {
    let mut endpoints = BTreeMap::from([
        ("contact", "POST /api/contact"),
        ("health", "GET /health"),
    ]);
    if !state.config.environment.is_production() {
        endpoints.insert("emailStatus", "GET /api/email/status");
    }

    Json(ApiInfo {
        message: API_TITLE,
        version: state.config.app.version,
        endpoints,
    })
}
