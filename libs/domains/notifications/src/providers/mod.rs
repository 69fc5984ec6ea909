//! Email provider implementations.
//!
//! This module contains the `EmailProvider` trait and the Brevo, SMTP and
//! in-memory backends behind it.

mod brevo;
mod mock;
mod smtp;

pub use brevo::BrevoProvider;
pub use mock::{MockProvider, Outbox};
pub use smtp::{LettreTransport, SmtpProvider, SmtpTransport};

use crate::error::{NotificationError, NotificationResult};
use crate::models::{BulkEmail, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
use crate::result::{DeliveryResult, Operation};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Contract every email backend fulfils.
///
/// Send-family methods never return `Err`: failures come back as
/// [`DeliveryResult::Failure`]. A provider is unusable until `initialize`
/// has returned `true`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Builds the transport and verifies connectivity. Logs and returns `false`
    /// on any failure.
    async fn initialize(&mut self) -> bool;

    /// Sends one message. Invalid messages fail before any transport call.
    async fn send_email(&self, message: &EmailMessage) -> DeliveryResult;

    /// Sends a provider-side template.
    async fn send_templated_email(&self, email: &TemplatedEmail) -> DeliveryResult;

    /// Sends the same content to every recipient.
    async fn send_bulk_email(&self, recipients: &[Recipient], email: &BulkEmail)
    -> DeliveryResult;

    /// Liveness check against the backend. Never errors.
    async fn test_connection(&self) -> bool;

    /// Static description. No network access.
    fn describe(&self) -> ProviderInfo;

    /// Message validation hook, shared by all backends unless overridden.
    fn validate(&self, message: &EmailMessage) -> NotificationResult<()> {
        message.validate()
    }

    /// Provider name used in results and logs.
    fn name(&self) -> &'static str;
}

/// Runs a transport call under `limit`, turning expiry into a transport failure.
pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> NotificationResult<T>
where
    F: Future<Output = NotificationResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(NotificationError::Timeout(limit)),
    }
}

/// Failure returned by send operations on a provider that is not ready.
pub(crate) fn not_ready(provider: &'static str, operation: Operation) -> DeliveryResult {
    DeliveryResult::failure(
        provider,
        &NotificationError::NotInitialized(format!("{provider} provider")),
        operation,
    )
}

/// Failure for a capability the backend does not offer.
pub(crate) fn unsupported(
    provider: &'static str,
    operation: Operation,
    detail: &str,
) -> DeliveryResult {
    DeliveryResult::failure(
        provider,
        &NotificationError::Unsupported(detail.to_string()),
        operation,
    )
}
