//! Error types for the notifications domain.

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Coarse classification carried by every failed [`DeliveryResult`](crate::DeliveryResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Malformed input caught before any transport call.
    Validation,
    /// Missing credentials, unknown provider, missing recipient.
    Configuration,
    /// The transport rejected or could not complete the call.
    Transport,
    /// Operation invoked before initialization succeeded.
    NotReady,
    /// The active backend does not offer the capability.
    Unsupported,
}

/// Errors that can occur in the notifications domain.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// One or more message invariants were violated.
    #[error("{}", .0.join(", "))]
    Validation(Vec<String>),

    /// A required field of a non-message payload is missing.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Bulk send invoked with no recipients.
    #[error("Recipients list is required")]
    EmptyRecipients,

    /// Provider credentials are absent from configuration.
    #[error("{0}")]
    MissingCredentials(String),

    /// Configuration value present but unusable.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No registry entry for the requested provider name.
    #[error("Unknown email provider: {0}")]
    UnknownProvider(String),

    /// The provider was constructed but its initialization returned false.
    #[error("Email provider ({0}) failed to initialize")]
    InitializationFailed(String),

    /// No contact-form recipient configured.
    #[error("Contact form recipient not configured")]
    RecipientNotConfigured,

    /// Provider (or the service) used before initialization succeeded.
    #[error("{0} not initialized")]
    NotInitialized(String),

    /// Transport-level failure (HTTP status, SMTP response, connection).
    #[error("{0}")]
    Transport(String),

    /// The transport call did not complete in time.
    #[error("Transport call timed out after {0:?}")]
    Timeout(Duration),

    /// Capability not offered by this backend.
    #[error("{0}")]
    Unsupported(String),
}

impl NotificationError {
    /// Maps the error onto the four-way failure taxonomy (plus capability gaps).
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) | Self::MissingField(_) | Self::EmptyRecipients => {
                FailureKind::Validation
            }
            Self::MissingCredentials(_)
            | Self::InvalidConfig(_)
            | Self::UnknownProvider(_)
            | Self::InitializationFailed(_)
            | Self::RecipientNotConfigured => FailureKind::Configuration,
            Self::Transport(_) | Self::Timeout(_) => FailureKind::Transport,
            Self::NotInitialized(_) => FailureKind::NotReady,
            Self::Unsupported(_) => FailureKind::Unsupported,
        }
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Transport(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for NotificationError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        NotificationError::Transport(format!("SMTP error: {}", err))
    }
}

impl From<lettre::error::Error> for NotificationError {
    fn from(err: lettre::error::Error) -> Self {
        NotificationError::Validation(vec![format!("Failed to build email message: {}", err)])
    }
}

impl From<lettre::address::AddressError> for NotificationError {
    fn from(err: lettre::address::AddressError) -> Self {
        NotificationError::Validation(vec![format!("Invalid address: {}", err)])
    }
}
