//! Notifications Domain
//!
//! Outbound email for the site: contact-form notifications plus general
//! transactional, templated and bulk sends through interchangeable backends.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  Contact API    │  ← Sanitized, rate-limited submissions
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │  EmailService   │  ← Composes contact emails, guards readiness
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ProviderRegistry │  ← Primary, then fallback, initialized once
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ Email Provider  │  ← Brevo, SMTP, in-memory mock
//! └─────────────────┘
//! ```
//!
//! Every send returns a [`DeliveryResult`]; failures never surface as `Err`
//! from the send path.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_notifications::{ContactForm, EmailConfig, EmailService};
//! use core_config::FromEnv;
//!
//! let service = EmailService::new(&EmailConfig::from_env()?);
//! service.initialize().await;
//!
//! let result = service.send_contact_form_email(&form).await;
//! ```

pub mod address;
pub mod compose;
pub mod config;
pub mod error;
pub mod models;
pub mod providers;
pub mod registry;
pub mod result;
pub mod service;

// Re-export commonly used types
pub use address::{is_valid_email, parse_email_address, ParsedAddress};
pub use compose::{compose_contact_form_message, ComposedMessage};
pub use config::{BrevoConfig, EmailConfig, MockConfig, SmtpConfig};
pub use error::{FailureKind, NotificationError, NotificationResult};
pub use models::{BulkEmail, ContactForm, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
pub use providers::{BrevoProvider, EmailProvider, MockProvider, Outbox, SmtpProvider};
pub use registry::{ProviderRegistry, ProviderSpec};
pub use result::{
    BulkSummary, DeliveryFailure, DeliveryResult, DeliverySuccess, Operation, RecipientOutcome,
    RecipientStatus,
};
pub use service::{EmailService, EmailServiceState};
