use axum::{Json, Router, extract::State, middleware, routing::post};
use axum_helpers::{
    ErrorResponse, RateLimit, SanitizedJson,
    errors::responses::{BadRequestJsonResponse, TooManyRequestsResponse},
    rate_limit,
};
use std::num::NonZeroU32;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ContactResult;
use crate::models::{ContactRequest, ContactResponse};
use crate::service::ContactService;

pub const TAG: &str = "Contact";

/// OpenAPI documentation for the contact API
#[derive(OpenApi)]
#[openapi(
    paths(submit_contact),
    components(
        schemas(ContactRequest, ContactResponse, ErrorResponse),
        responses(BadRequestJsonResponse, TooManyRequestsResponse)
    ),
    tags(
        (name = TAG, description = "Website contact form")
    )
)]
pub struct ApiDoc;

/// Per-client submission quota for the contact form.
pub fn contact_rate_limit(per_hour: NonZeroU32) -> RateLimit {
    RateLimit::per_hour(per_hour).with_rejection(
        "Too many submissions",
        &format!(
            "You can only submit the contact form {} times per hour. Please try again later.",
            per_hour
        ),
    )
}

/// Create the contact router. Mount it at `/contact` under `/api`.
pub fn router(service: ContactService, limit: RateLimit) -> Router {
    Router::new()
        .route("/", post(submit_contact))
        .route_layer(middleware::from_fn_with_state(limit, rate_limit))
        .with_state(Arc::new(service))
}

/// Submit the contact form
///
/// Sends the submission to the site owner by email.
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Message accepted and emailed", body = ContactResponse),
        (status = 400, description = "Missing fields, invalid email or message length", body = ErrorResponse),
        (status = 429, response = TooManyRequestsResponse),
        (status = 500, description = "Email could not be sent", body = ErrorResponse)
    )
)]
async fn submit_contact(
    State(service): State<Arc<ContactService>>,
    SanitizedJson(request): SanitizedJson<ContactRequest>,
) -> ContactResult<Json<ContactResponse>> {
    let response = service.submit(request).await?;
    Ok(Json(response))
}
