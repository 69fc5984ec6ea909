//! Uniform outcome of every send operation.

use crate::error::{FailureKind, NotificationError};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// The send operation a result belongs to. Its label prefixes failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Validation,
    SendEmail,
    SendTemplatedEmail,
    SendBulkEmail,
}

impl Operation {
    pub fn label(self) -> &'static str {
        match self {
            Operation::Validation => "Email validation",
            Operation::SendEmail => "Send email",
            Operation::SendTemplatedEmail => "Send templated email",
            Operation::SendBulkEmail => "Send bulk email",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOutcome {
    pub email: String,
    pub status: RecipientStatus,
}

/// Aggregate of a bulk send.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total_recipients: usize,
    pub sent: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<RecipientOutcome>,
}

impl BulkSummary {
    pub fn new(total_recipients: usize) -> Self {
        Self {
            total_recipients,
            ..Default::default()
        }
    }

    pub fn record(&mut self, email: &str, status: RecipientStatus) {
        match status {
            RecipientStatus::Sent => self.sent += 1,
            RecipientStatus::Failed => self.failed += 1,
        }
        self.results.push(RecipientOutcome {
            email: email.to_string(),
            status,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySuccess {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_count: Option<usize>,
    #[serde(flatten)]
    pub bulk: Option<BulkSummary>,
}

impl DeliverySuccess {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            timestamp: Utc::now(),
            message_id: None,
            to: None,
            subject: None,
            template_id: None,
            recipient_count: None,
            bulk: None,
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_to(mut self, to: impl Into<String>) -> Self {
        self.to = Some(to.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_template_id(mut self, template_id: impl Into<String>) -> Self {
        self.template_id = Some(template_id.into());
        self
    }

    pub fn with_recipient_count(mut self, count: usize) -> Self {
        self.recipient_count = Some(count);
        self
    }

    pub fn with_bulk(mut self, bulk: BulkSummary) -> Self {
        self.bulk = Some(bulk);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryFailure {
    pub provider: String,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub error: String,
    pub details: String,
    pub kind: FailureKind,
    #[serde(flatten)]
    pub bulk: Option<BulkSummary>,
}

/// Success or failure of a send. Serializes flat with a leading `success` flag.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryResult {
    Success(DeliverySuccess),
    Failure(DeliveryFailure),
}

impl DeliveryResult {
    pub fn success(success: DeliverySuccess) -> Self {
        DeliveryResult::Success(success)
    }

    /// Normalizes a provider error into `"<operation> failed"` plus its detail.
    pub fn failure(
        provider: impl Into<String>,
        error: &NotificationError,
        operation: Operation,
    ) -> Self {
        DeliveryResult::Failure(DeliveryFailure {
            provider: provider.into(),
            timestamp: Utc::now(),
            operation,
            error: format!("{} failed", operation.label()),
            details: error.to_string(),
            kind: error.kind(),
            bulk: None,
        })
    }

    /// A failure with a fixed message, used where no provider error exists.
    pub fn rejected(
        provider: impl Into<String>,
        operation: Operation,
        error: impl Into<String>,
        kind: FailureKind,
    ) -> Self {
        let error = error.into();
        DeliveryResult::Failure(DeliveryFailure {
            provider: provider.into(),
            timestamp: Utc::now(),
            operation,
            details: error.clone(),
            error,
            kind,
            bulk: None,
        })
    }

    /// Outcome of a send-per-recipient bulk run. Succeeds when at least one
    /// recipient was sent to; the summary is attached either way.
    pub fn from_bulk(provider: impl Into<String>, summary: BulkSummary) -> Self {
        let provider = provider.into();
        if summary.sent > 0 {
            return DeliveryResult::success(
                DeliverySuccess::new(provider)
                    .with_recipient_count(summary.total_recipients)
                    .with_bulk(summary),
            );
        }

        let error = NotificationError::Transport(format!(
            "All {} recipients failed",
            summary.total_recipients
        ));
        let operation = Operation::SendBulkEmail;
        DeliveryResult::Failure(DeliveryFailure {
            provider,
            timestamp: Utc::now(),
            operation,
            error: format!("{} failed", operation.label()),
            details: error.to_string(),
            kind: error.kind(),
            bulk: Some(summary),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeliveryResult::Success(_))
    }

    pub fn provider(&self) -> &str {
        match self {
            DeliveryResult::Success(s) => &s.provider,
            DeliveryResult::Failure(f) => &f.provider,
        }
    }

    pub fn message_id(&self) -> Option<&str> {
        match self {
            DeliveryResult::Success(s) => s.message_id.as_deref(),
            DeliveryResult::Failure(_) => None,
        }
    }

    /// Failure message, `None` on success.
    pub fn error(&self) -> Option<&str> {
        match self {
            DeliveryResult::Success(_) => None,
            DeliveryResult::Failure(f) => Some(&f.error),
        }
    }

    pub fn details(&self) -> Option<&str> {
        match self {
            DeliveryResult::Success(_) => None,
            DeliveryResult::Failure(f) => Some(&f.details),
        }
    }

    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            DeliveryResult::Success(_) => None,
            DeliveryResult::Failure(f) => Some(f.kind),
        }
    }

    pub fn bulk(&self) -> Option<&BulkSummary> {
        match self {
            DeliveryResult::Success(s) => s.bulk.as_ref(),
            DeliveryResult::Failure(f) => f.bulk.as_ref(),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    success: bool,
    #[serde(flatten)]
    body: &'a T,
}

impl Serialize for DeliveryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DeliveryResult::Success(body) => Envelope {
                success: true,
                body,
            }
            .serialize(serializer),
            DeliveryResult::Failure(body) => Envelope {
                success: false,
                body,
            }
            .serialize(serializer),
        }
    }
}
