//! Email diagnostics, mounted outside production only

use axum::{Json, extract::State};
use axum_helpers::{AppError, errors::responses::ServiceUnavailableResponse};
use domain_notifications::{EmailServiceState, ProviderInfo};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct EmailStatus {
    pub success: bool,
    #[schema(value_type = String, example = "ready")]
    pub state: EmailServiceState,
    #[schema(value_type = Object)]
    pub provider: ProviderInfo,
    /// Result of a live connection check against the provider
    pub connected: bool,
}

/// Active email provider and a live connection check
#[utoipa::path(
    get,
    path = "/api/email/status",
    tag = "Meta",
    responses(
        (status = 200, description = "Provider details", body = EmailStatus),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
pub async fn email_status(State(state): State<AppState>) -> Result<Json<EmailStatus>, AppError> {
    let provider = state
        .email
        .provider_info()
        .map_err(|_| AppError::ServiceUnavailable("Email service not initialized".to_string()))?;
    let connected = state.email.test_connection().await;

    Ok(Json(EmailStatus {
        success: true,
        state: state.email.state(),
        provider,
        connected,
    }))
}
