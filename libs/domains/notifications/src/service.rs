//! Delivery facade used by the rest of the application.

use crate::compose::compose_contact_form_message;
use crate::config::EmailConfig;
use crate::error::{FailureKind, NotificationError, NotificationResult};
use crate::models::{BulkEmail, ContactForm, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
use crate::providers::EmailProvider;
use crate::registry::ProviderRegistry;
use crate::result::{DeliveryResult, Operation};
use chrono::Utc;
use serde::Serialize;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{error, info, warn};

const SERVICE: &str = "EmailService";
const NOT_INITIALIZED: &str = "Email service not initialized";

/// Readiness of the email service as reported by health checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailServiceState {
    /// Initialization has not finished yet.
    Pending,
    Ready,
    /// No provider could be initialized.
    Unavailable,
}

impl EmailServiceState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EmailServiceState::Ready,
            2 => EmailServiceState::Unavailable,
            _ => EmailServiceState::Pending,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            EmailServiceState::Pending => 0,
            EmailServiceState::Ready => 1,
            EmailServiceState::Unavailable => 2,
        }
    }
}

/// Single entry point for sending email.
///
/// Holds the provider registry and, once initialization succeeds, the active
/// provider. The active provider is set at most once and reused for the
/// lifetime of the process.
pub struct EmailService {
    registry: ProviderRegistry,
    primary: String,
    fallback: Option<String>,
    contact_recipient: Option<String>,
    active: OnceLock<Arc<dyn EmailProvider>>,
    state: AtomicU8,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Self {
        Self::with_registry(
            ProviderRegistry::from_config(config),
            config.provider.clone(),
            config.fallback_provider.clone(),
            config.contact_recipient.clone(),
        )
    }

    pub fn with_registry(
        registry: ProviderRegistry,
        primary: impl Into<String>,
        fallback: Option<String>,
        contact_recipient: Option<String>,
    ) -> Self {
        Self {
            registry,
            primary: primary.into(),
            fallback,
            contact_recipient,
            active: OnceLock::new(),
            state: AtomicU8::new(EmailServiceState::Pending.as_u8()),
        }
    }

    /// Initializes the primary provider, falling back to the secondary when
    /// configured. Returns whether a provider is active afterwards.
    pub async fn initialize(&self) -> bool {
        if self.active.get().is_some() {
            return true;
        }

        match self
            .registry
            .select(&self.primary, self.fallback.as_deref())
            .await
        {
            // A concurrent initialization may have won the slot first.
            Some(provider) => self.activate(provider) || self.is_ready(),
            None => {
                self.set_state(EmailServiceState::Unavailable);
                error!(
                    primary = %self.primary,
                    fallback = ?self.fallback,
                    "Failed to initialize email service"
                );
                false
            }
        }
    }

    /// Initializes one named provider and makes it active.
    pub async fn initialize_provider(&self, name: &str) -> bool {
        match self.registry.initialize_provider(name).await {
            Ok(provider) => self.activate(provider),
            Err(e) => {
                error!(provider = name, error = %e, "Failed to initialize email provider");
                if self.active.get().is_none() {
                    self.set_state(EmailServiceState::Unavailable);
                }
                false
            }
        }
    }

    fn activate(&self, provider: Arc<dyn EmailProvider>) -> bool {
        let name = provider.name();
        match self.active.set(provider) {
            Ok(()) => {
                self.set_state(EmailServiceState::Ready);
                info!(provider = name, "Email service initialized");
                true
            }
            Err(_) => {
                warn!(
                    provider = name,
                    active = ?self.active_provider_name(),
                    "Email provider already active, ignoring new provider"
                );
                false
            }
        }
    }

    fn set_state(&self, state: EmailServiceState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn state(&self) -> EmailServiceState {
        EmailServiceState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.active.get().is_some()
    }

    pub fn active_provider_name(&self) -> Option<&'static str> {
        self.active.get().map(|p| p.name())
    }

    fn not_initialized(operation: Operation) -> DeliveryResult {
        DeliveryResult::rejected(SERVICE, operation, NOT_INITIALIZED, FailureKind::NotReady)
    }

    /// Sends through the active provider.
    pub async fn send_email(&self, message: &EmailMessage) -> DeliveryResult {
        let Some(provider) = self.active.get() else {
            warn!(to = %message.to, "Email send attempted before initialization");
            return Self::not_initialized(Operation::SendEmail);
        };

        let result = provider.send_email(message).await;
        info!(
            success = result.is_success(),
            provider = provider.name(),
            to = %message.to,
            "Email send attempt"
        );
        result
    }

    /// Notifies the site owner about a contact-form submission.
    ///
    /// The submitter becomes the reply-to address.
    pub async fn send_contact_form_email(&self, form: &ContactForm) -> DeliveryResult {
        let Some(recipient) = self.contact_recipient.as_deref() else {
            error!("No contact form recipient configured");
            return DeliveryResult::rejected(
                SERVICE,
                Operation::SendEmail,
                NotificationError::RecipientNotConfigured.to_string(),
                FailureKind::Configuration,
            );
        };

        let composed = compose_contact_form_message(form, Utc::now());
        let message = EmailMessage::new(recipient, composed.subject)
            .with_html(composed.html)
            .with_text(composed.text)
            .with_reply_to(&form.email);

        self.send_email(&message).await
    }

    pub async fn send_templated_email(&self, email: &TemplatedEmail) -> DeliveryResult {
        match self.active.get() {
            Some(provider) => provider.send_templated_email(email).await,
            None => Self::not_initialized(Operation::SendTemplatedEmail),
        }
    }

    pub async fn send_bulk_email(&self, recipients: &[Recipient], email: &BulkEmail) -> DeliveryResult {
        match self.active.get() {
            Some(provider) => {
                let result = provider.send_bulk_email(recipients, email).await;
                info!(
                    success = result.is_success(),
                    provider = provider.name(),
                    recipients = recipients.len(),
                    "Bulk email attempt"
                );
                result
            }
            None => Self::not_initialized(Operation::SendBulkEmail),
        }
    }

    /// Live connection check of the active provider; `false` when none is active.
    pub async fn test_connection(&self) -> bool {
        match self.active.get() {
            Some(provider) => provider.test_connection().await,
            None => false,
        }
    }

    pub fn provider_info(&self) -> NotificationResult<ProviderInfo> {
        self.active
            .get()
            .map(|provider| provider.describe())
            .ok_or_else(|| NotificationError::NotInitialized("Email service".to_string()))
    }
}
