use axum_helpers::Sanitize;
use domain_notifications::{ContactForm, is_valid_email};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

pub const MESSAGE_MIN_CHARS: usize = 10;
pub const MESSAGE_MAX_CHARS: usize = 5000;

fn validate_email_address(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email"))
    }
}

fn validate_message_length(message: &str) -> Result<(), ValidationError> {
    match message.chars().count() {
        n if n < MESSAGE_MIN_CHARS => Err(ValidationError::new("too_short")),
        n if n > MESSAGE_MAX_CHARS => Err(ValidationError::new("too_long")),
        _ => Ok(()),
    }
}

/// Contact-form submission as posted by the website.
///
/// Missing text fields deserialize as empty strings so they surface as
/// validation errors rather than JSON errors.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,

    #[serde(default)]
    #[validate(
        length(min = 1, code = "required"),
        custom(function = "validate_email_address")
    )]
    #[schema(example = "ada@example.com")]
    pub email: String,

    #[serde(default)]
    pub company: Option<String>,

    /// Service the visitor is interested in
    #[serde(default)]
    pub service: Option<String>,

    #[serde(default)]
    #[validate(
        length(min = 1, code = "required"),
        custom(function = "validate_message_length")
    )]
    #[schema(min_length = 10, max_length = 5000)]
    pub message: String,
}

impl Sanitize for ContactRequest {
    fn sanitize(&mut self) {
        self.name.sanitize();
        self.email.sanitize();
        self.company.sanitize();
        self.service.sanitize();
        self.message.sanitize();
    }
}

impl From<ContactRequest> for ContactForm {
    fn from(request: ContactRequest) -> Self {
        ContactForm {
            name: request.name,
            email: request.email,
            company: request.company,
            service: request.service,
            message: request.message,
        }
    }
}

/// Body of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContactResponse {
    pub success: bool,
    #[schema(example = "Thank you for your message! We will get back to you soon.")]
    pub message: String,
}

impl ContactResponse {
    pub fn received() -> Self {
        Self {
            success: true,
            message: "Thank you for your message! We will get back to you soon.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            company: None,
            service: None,
            message: "I would like a quote.".to_string(),
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_message_bounds_count_characters() {
        let mut short = request();
        short.message = "é".repeat(9);
        assert!(short.validate().is_err());

        let mut exact = request();
        exact.message = "é".repeat(MESSAGE_MAX_CHARS);
        assert!(exact.validate().is_ok());

        let mut long = request();
        long.message = "a".repeat(MESSAGE_MAX_CHARS + 1);
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_sanitize_strips_markup() {
        let mut request = request();
        request.name = " Ada<script>x()</script> ".to_string();
        request.company = Some("<iframe src=x></iframe>Engines Ltd".to_string());

        request.sanitize();

        assert_eq!(request.name, "Ada");
        assert_eq!(request.company.as_deref(), Some("Engines Ltd"));
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let request: ContactRequest = serde_json::from_str(r#"{"email":"ada@example.com"}"#).unwrap();
        assert!(request.name.is_empty());
        assert!(request.validate().is_err());
    }
}
