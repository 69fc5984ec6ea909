//! In-memory provider for local development and tests.
//!
//! Nothing leaves the process: accepted messages land in a shared [`Outbox`]
//! that keeps only the most recent [`OUTBOX_CAPACITY`] of each kind.

use super::{EmailProvider, not_ready};
use crate::config::MockConfig;
use crate::error::NotificationError;
use crate::models::{BulkEmail, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
use crate::result::{BulkSummary, DeliveryResult, DeliverySuccess, Operation, RecipientStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const PROVIDER: &str = "Mock";

pub const OUTBOX_CAPACITY: usize = 256;

#[derive(Debug, Default)]
struct OutboxInner {
    emails: VecDeque<EmailMessage>,
    templated: VecDeque<TemplatedEmail>,
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T) {
    if queue.len() == OUTBOX_CAPACITY {
        queue.pop_front();
    }
    queue.push_back(item);
}

/// Shared record of everything a [`MockProvider`] accepted.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    inner: Arc<Mutex<OutboxInner>>,
}

impl Outbox {
    fn lock(&self) -> MutexGuard<'_, OutboxInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn emails(&self) -> Vec<EmailMessage> {
        self.lock().emails.iter().cloned().collect()
    }

    pub fn templated(&self) -> Vec<TemplatedEmail> {
        self.lock().templated.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<EmailMessage> {
        self.lock().emails.back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.emails.clear();
        inner.templated.clear();
    }
}

pub struct MockProvider {
    config: MockConfig,
    outbox: Outbox,
    sequence: AtomicU64,
    initialized: bool,
}

impl MockProvider {
    pub fn new(config: MockConfig) -> Self {
        Self {
            outbox: config.outbox.clone(),
            config,
            sequence: AtomicU64::new(0),
            initialized: false,
        }
    }

    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }

    fn next_message_id(&self) -> String {
        let n = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("<mock-{n}@localhost>")
    }

    fn rejects(&self, address: &str) -> bool {
        self.config
            .failing_recipients
            .iter()
            .any(|f| f.eq_ignore_ascii_case(address))
    }
}

#[async_trait]
impl EmailProvider for MockProvider {
    async fn initialize(&mut self) -> bool {
        if self.config.fail_initialize {
            warn!("Mock provider configured to fail initialization");
            self.initialized = false;
            return false;
        }
        if !self.test_connection().await {
            warn!("Mock provider connection check failed");
            self.initialized = false;
            return false;
        }
        self.initialized = true;
        info!("Mock email provider initialized");
        true
    }

    async fn send_email(&self, message: &EmailMessage) -> DeliveryResult {
        if !self.initialized {
            return not_ready(PROVIDER, Operation::SendEmail);
        }
        if let Err(e) = self.validate(message) {
            return DeliveryResult::failure(PROVIDER, &e, Operation::Validation);
        }
        if self.rejects(&message.to) {
            let e = NotificationError::Transport(format!("Mailbox unavailable: {}", message.to));
            warn!(to = %message.to, "Mock provider rejected recipient");
            return DeliveryResult::failure(PROVIDER, &e, Operation::SendEmail);
        }

        let message_id = self.next_message_id();
        push_bounded(&mut self.outbox.lock().emails, message.clone());
        debug!(to = %message.to, message_id = %message_id, "Email captured by mock provider");

        DeliveryResult::success(
            DeliverySuccess::new(PROVIDER)
                .with_message_id(message_id)
                .with_to(&message.to)
                .with_subject(&message.subject),
        )
    }

    async fn send_templated_email(&self, email: &TemplatedEmail) -> DeliveryResult {
        let operation = Operation::SendTemplatedEmail;
        if !self.initialized {
            return not_ready(PROVIDER, operation);
        }
        if let Err(e) = email.validate() {
            return DeliveryResult::failure(PROVIDER, &e, operation);
        }

        let message_id = self.next_message_id();
        push_bounded(&mut self.outbox.lock().templated, email.clone());

        DeliveryResult::success(
            DeliverySuccess::new(PROVIDER)
                .with_message_id(message_id)
                .with_template_id(&email.template_id)
                .with_to(&email.to),
        )
    }

    async fn send_bulk_email(&self, recipients: &[Recipient], email: &BulkEmail) -> DeliveryResult {
        let operation = Operation::SendBulkEmail;
        if !self.initialized {
            return not_ready(PROVIDER, operation);
        }
        if recipients.is_empty() {
            return DeliveryResult::failure(PROVIDER, &NotificationError::EmptyRecipients, operation);
        }

        let mut summary = BulkSummary::new(recipients.len());
        for (index, recipient) in recipients.iter().enumerate() {
            let result = self.send_email(&email.for_recipient(recipient.address())).await;
            let status = if result.is_success() {
                RecipientStatus::Sent
            } else {
                RecipientStatus::Failed
            };
            summary.record(recipient.address(), status);

            if index + 1 < recipients.len() && !self.config.bulk_send_delay.is_zero() {
                tokio::time::sleep(self.config.bulk_send_delay).await;
            }
        }

        DeliveryResult::from_bulk(PROVIDER, summary)
    }

    async fn test_connection(&self) -> bool {
        self.config.connection_ok
    }

    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.to_string(),
            initialized: self.initialized,
            has_credentials: false,
            features: vec![
                "In-memory outbox".to_string(),
                "Template support".to_string(),
                "Bulk emails".to_string(),
            ],
            details: None,
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
