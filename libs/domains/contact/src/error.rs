use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_helpers::{ErrorCode, ErrorResponse};
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContactError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid email")]
    InvalidEmail,

    #[error("Message too short")]
    MessageTooShort,

    #[error("Message too long")]
    MessageTooLong,

    #[error("Email sending failed: {0}")]
    DeliveryFailed(String),
}

pub type ContactResult<T> = Result<T, ContactError>;

impl ContactError {
    pub fn status(&self) -> StatusCode {
        match self {
            ContactError::DeliveryFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Text shown to the visitor. Provider detail never leaves the server.
    pub fn user_message(&self) -> &'static str {
        match self {
            ContactError::MissingFields => "Name, email, and message are required",
            ContactError::InvalidEmail => "Please provide a valid email address",
            ContactError::MessageTooShort => {
                "Please provide a more detailed message (at least 10 characters)"
            }
            ContactError::MessageTooLong => "Message cannot exceed 5000 characters",
            ContactError::DeliveryFailed(_) => {
                "We could not send your message. Please try again later or contact us directly."
            }
        }
    }

    /// Short label for the `error` field of the response.
    pub fn error_label(&self) -> &'static str {
        match self {
            ContactError::MissingFields => "Missing required fields",
            ContactError::InvalidEmail => "Invalid email",
            ContactError::MessageTooShort => "Message too short",
            ContactError::MessageTooLong => "Message too long",
            ContactError::DeliveryFailed(_) => "Email sending failed",
        }
    }

    fn error_code(&self) -> ErrorCode {
        match self {
            ContactError::DeliveryFailed(_) => ErrorCode::InternalError,
            _ => ErrorCode::ValidationError,
        }
    }
}

fn has_error(errors: &ValidationErrors, field: &str, code: &str) -> bool {
    errors
        .field_errors()
        .get(field)
        .is_some_and(|errs| errs.iter().any(|e| e.code == code))
}

/// Reduces field errors to the single most relevant problem: missing fields,
/// then email format, then message length.
impl From<ValidationErrors> for ContactError {
    fn from(errors: ValidationErrors) -> Self {
        if ["name", "email", "message"]
            .iter()
            .any(|field| has_error(&errors, field, "required"))
        {
            ContactError::MissingFields
        } else if has_error(&errors, "email", "invalid_email") {
            ContactError::InvalidEmail
        } else if has_error(&errors, "message", "too_short") {
            ContactError::MessageTooShort
        } else if has_error(&errors, "message", "too_long") {
            ContactError::MessageTooLong
        } else {
            ContactError::MissingFields
        }
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(self.error_label(), self.user_message())
            .with_code(self.error_code());

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactRequest;
    use validator::Validate;

    fn classify(name: &str, email: &str, message: &str) -> ContactError {
        let request = ContactRequest {
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
            ..Default::default()
        };
        request.validate().unwrap_err().into()
    }

    #[test]
    fn test_missing_fields_win_over_other_problems() {
        assert_eq!(classify("", "not-an-email", "short"), ContactError::MissingFields);
        assert_eq!(classify("Ada", "", "long enough text"), ContactError::MissingFields);
    }

    #[test]
    fn test_field_problems_in_order() {
        assert_eq!(classify("Ada", "not-an-email", "short"), ContactError::InvalidEmail);
        assert_eq!(classify("Ada", "ada@example.com", "short"), ContactError::MessageTooShort);
        assert_eq!(
            classify("Ada", "ada@example.com", &"a".repeat(5001)),
            ContactError::MessageTooLong
        );
    }

    #[test]
    fn test_delivery_failure_hides_detail() {
        let err = ContactError::DeliveryFailed("Brevo API error: bad key".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.user_message().contains("Brevo"));
    }
}
