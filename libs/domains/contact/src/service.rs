use domain_notifications::{ContactForm, EmailService};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::error::{ContactError, ContactResult};
use crate::models::{ContactRequest, ContactResponse};

/// Validates submissions and forwards them to the site owner by email.
#[derive(Clone)]
pub struct ContactService {
    email: Arc<EmailService>,
}

impl ContactService {
    pub fn new(email: Arc<EmailService>) -> Self {
        Self { email }
    }

    /// Expects already sanitized input. Nothing is sent unless validation passes.
    pub async fn submit(&self, request: ContactRequest) -> ContactResult<ContactResponse> {
        request.validate().map_err(ContactError::from)?;

        info!(
            name = %request.name,
            email = %request.email,
            company = request.company.as_deref().unwrap_or("Not provided"),
            service = request.service.as_deref().unwrap_or("Not specified"),
            "Contact form submission received"
        );

        let form = ContactForm::from(request);
        let result = self.email.send_contact_form_email(&form).await;

        if result.is_success() {
            info!(from = %form.email, "Contact form email sent successfully");
            Ok(ContactResponse::received())
        } else {
            let reason = result.error().unwrap_or("unknown error").to_string();
            error!(error = %reason, provider = result.provider(), "Failed to send contact form email");
            Err(ContactError::DeliveryFailed(reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_notifications::{MockConfig, Outbox, ProviderRegistry, ProviderSpec};
    use std::time::Duration;

    async fn service(config: MockConfig) -> ContactService {
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        registry.register("mock", ProviderSpec::Mock(config));
        let email = EmailService::with_registry(
            registry,
            "mock",
            None,
            Some("owner@example.com".to_string()),
        );
        assert!(email.initialize().await);
        ContactService::new(Arc::new(email))
    }

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            company: Some("Engines Ltd".to_string()),
            service: None,
            message: "Could you help with an analytical engine?".to_string(),
        }
    }

    #[tokio::test]
    async fn test_valid_submission_is_emailed() {
        let outbox = Outbox::default();
        let service = service(MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        })
        .await;

        let response = service.submit(request()).await.unwrap();

        assert!(response.success);
        let sent = outbox.last().unwrap();
        assert_eq!(sent.to, "owner@example.com");
        assert_eq!(sent.reply_to.as_deref(), Some("ada@example.com"));
    }

    #[tokio::test]
    async fn test_invalid_submission_never_reaches_provider() {
        let outbox = Outbox::default();
        let service = service(MockConfig {
            outbox: outbox.clone(),
            ..Default::default()
        })
        .await;

        let mut invalid = request();
        invalid.email = "ada-at-example".to_string();

        assert_eq!(service.submit(invalid).await.unwrap_err(), ContactError::InvalidEmail);
        assert!(outbox.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported() {
        let service =
            service(MockConfig::default().with_failing_recipient("owner@example.com")).await;

        let err = service.submit(request()).await.unwrap_err();

        assert!(matches!(err, ContactError::DeliveryFailed(_)));
    }
}
