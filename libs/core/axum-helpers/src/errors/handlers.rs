use axum::{
    extract::OriginalUri,
    response::{IntoResponse, Response},
};

use super::AppError;

/// Handler for 404 Not Found errors.
///
/// Reports the full request path, even when used as a nested router's fallback.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> Response {
    AppError::NotFound(format!("Route {} not found", uri.path())).into_response()
}

/// Handler for 405 Method Not Allowed errors.
pub async fn method_not_allowed() -> Response {
    AppError::MethodNotAllowed.into_response()
}
