//! Brevo (formerly Sendinblue) transactional email provider.

use super::{EmailProvider, not_ready, with_timeout};
use crate::address::parse_email_address;
use crate::config::{BrevoConfig, DEFAULT_SENDER_EMAIL, DEFAULT_SENDER_NAME};
use crate::error::{NotificationError, NotificationResult};
use crate::models::{BulkEmail, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
use crate::result::{BulkSummary, DeliveryResult, DeliverySuccess, Operation};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PROVIDER: &str = "Brevo";

/// Brevo provider talking to the v3 REST API.
pub struct BrevoProvider {
    config: BrevoConfig,
    timeout: Duration,
    client: Option<Client>,
    initialized: bool,
}

impl BrevoProvider {
    pub fn new(config: BrevoConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            client: None,
            initialized: false,
        }
    }

    fn api_key(&self) -> &str {
        self.config.api_key.as_deref().unwrap_or_default()
    }

    fn default_sender(&self) -> Contact {
        let name = if self.config.sender_name.trim().is_empty() {
            DEFAULT_SENDER_NAME
        } else {
            &self.config.sender_name
        };
        let email = if self.config.sender_email.trim().is_empty() {
            DEFAULT_SENDER_EMAIL
        } else {
            &self.config.sender_email
        };
        Contact {
            email: email.to_string(),
            name: Some(name.to_string()),
        }
    }

    fn sender(&self, from: Option<&str>) -> Contact {
        from.map(Contact::parse)
            .unwrap_or_else(|| self.default_sender())
    }

    /// The HTTP client, only once initialization has succeeded.
    fn ready_client(&self) -> Option<&Client> {
        self.client.as_ref().filter(|_| self.initialized)
    }

    async fn try_initialize(&mut self) -> NotificationResult<()> {
        if self.config.api_key.is_none() {
            return Err(NotificationError::MissingCredentials(
                "Brevo API key is required".to_string(),
            ));
        }

        self.client = Some(Client::builder().build()?);

        if !self.test_connection().await {
            return Err(NotificationError::Transport(
                "Failed to connect to Brevo API".to_string(),
            ));
        }

        Ok(())
    }

    async fn fetch_account(&self, client: &Client) -> NotificationResult<()> {
        with_timeout(self.timeout, async {
            let response = client
                .get(format!("{}/account", self.config.api_url))
                .header("api-key", self.api_key())
                .header("accept", "application/json")
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(api_error(status, &body))
            }
        })
        .await
    }

    /// Posts to `/smtp/email` and returns the message id Brevo assigned.
    async fn post_email(&self, client: &Client, request: &SendSmtpEmail) -> NotificationResult<String> {
        with_timeout(self.timeout, async {
            let response = client
                .post(format!("{}/smtp/email", self.config.api_url))
                .header("api-key", self.api_key())
                .header("accept", "application/json")
                .json(request)
                .send()
                .await?;

            let status = response.status();
            if status.is_success() {
                let body: SendResponse = response.json().await.unwrap_or_default();
                Ok(body
                    .message_id
                    .or_else(|| body.message_ids.into_iter().next())
                    .unwrap_or_else(|| "unknown".to_string()))
            } else {
                let body = response.text().await.unwrap_or_default();
                Err(api_error(status, &body))
            }
        })
        .await
    }
}

// Brevo API request/response structures

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Contact {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

impl Contact {
    fn parse(address: &str) -> Self {
        let parsed = parse_email_address(address);
        Self {
            email: parsed.email,
            name: parsed.name,
        }
    }
}

impl From<&Recipient> for Contact {
    fn from(recipient: &Recipient) -> Self {
        match recipient {
            Recipient::Address(address) => Contact::parse(address),
            Recipient::Named { email, name } => Contact {
                email: email.trim().to_string(),
                name: name.clone(),
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendSmtpEmail {
    sender: Option<Contact>,
    to: Vec<Contact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<Contact>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    bcc: Vec<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<Contact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    template_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: Option<String>,
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BrevoError {
    message: String,
}

fn api_error(status: reqwest::StatusCode, body: &str) -> NotificationError {
    let message = serde_json::from_str::<BrevoError>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.to_string());
    NotificationError::Transport(format!("Brevo API error ({}): {}", status, message))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[async_trait]
impl EmailProvider for BrevoProvider {
    async fn initialize(&mut self) -> bool {
        match self.try_initialize().await {
            Ok(()) => {
                self.initialized = true;
                let sender = self.default_sender();
                info!(
                    sender_email = %sender.email,
                    sender_name = ?sender.name,
                    "Brevo email provider initialized"
                );
                true
            }
            Err(e) => {
                self.initialized = false;
                error!(error = %e, "Failed to initialize Brevo provider");
                false
            }
        }
    }

    async fn send_email(&self, message: &EmailMessage) -> DeliveryResult {
        let Some(client) = self.ready_client() else {
            return not_ready(PROVIDER, Operation::SendEmail);
        };

        if let Err(e) = self.validate(message) {
            warn!(to = %message.to, error = %e, "Rejected invalid email");
            return DeliveryResult::failure(PROVIDER, &e, Operation::Validation);
        }

        let request = SendSmtpEmail {
            sender: Some(self.sender(message.from.as_deref())),
            to: vec![Contact::parse(&message.to)],
            cc: message.cc.iter().map(|a| Contact::parse(a)).collect(),
            bcc: message.bcc.iter().map(|a| Contact::parse(a)).collect(),
            reply_to: message.reply_to.as_deref().map(Contact::parse),
            subject: Some(message.subject.clone()),
            html_content: non_empty(message.html_body()),
            text_content: non_empty(message.text_body()),
            ..Default::default()
        };

        debug!(
            to = %message.to,
            subject = %message.subject,
            cc_count = message.cc.len(),
            bcc_count = message.bcc.len(),
            has_reply_to = message.reply_to.is_some(),
            "Sending email via Brevo"
        );

        match self.post_email(client, &request).await {
            Ok(message_id) => {
                info!(
                    message_id = %message_id,
                    to = %message.to,
                    subject = %message.subject,
                    "Email sent via Brevo"
                );
                DeliveryResult::success(
                    DeliverySuccess::new(PROVIDER)
                        .with_message_id(message_id)
                        .with_to(&message.to)
                        .with_subject(&message.subject),
                )
            }
            Err(e) => {
                error!(to = %message.to, error = %e, "Failed to send email via Brevo");
                DeliveryResult::failure(PROVIDER, &e, Operation::SendEmail)
            }
        }
    }

    async fn send_templated_email(&self, email: &TemplatedEmail) -> DeliveryResult {
        let operation = Operation::SendTemplatedEmail;
        let Some(client) = self.ready_client() else {
            return not_ready(PROVIDER, operation);
        };

        if let Err(e) = email.validate() {
            return DeliveryResult::failure(PROVIDER, &e, operation);
        }

        let template_id = match email.template_id.trim().parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                let e = NotificationError::Validation(vec![format!(
                    "Template ID must be numeric, got '{}'",
                    email.template_id
                )]);
                return DeliveryResult::failure(PROVIDER, &e, operation);
            }
        };

        let request = SendSmtpEmail {
            sender: Some(self.sender(email.from.as_deref())),
            to: vec![Contact::parse(&email.to)],
            template_id: Some(template_id),
            params: Some(email.variables.clone()),
            ..Default::default()
        };

        match self.post_email(client, &request).await {
            Ok(message_id) => {
                info!(template_id, to = %email.to, "Templated email sent via Brevo");
                DeliveryResult::success(
                    DeliverySuccess::new(PROVIDER)
                        .with_message_id(message_id)
                        .with_template_id(&email.template_id)
                        .with_to(&email.to),
                )
            }
            Err(e) => {
                error!(template_id, to = %email.to, error = %e, "Failed to send templated email via Brevo");
                DeliveryResult::failure(PROVIDER, &e, operation)
            }
        }
    }

    async fn send_bulk_email(&self, recipients: &[Recipient], email: &BulkEmail) -> DeliveryResult {
        let operation = Operation::SendBulkEmail;
        let Some(client) = self.ready_client() else {
            return not_ready(PROVIDER, operation);
        };

        if let Err(e) = email.validate(recipients) {
            warn!(recipient_count = recipients.len(), error = %e, "Rejected invalid bulk email");
            return DeliveryResult::failure(PROVIDER, &e, operation);
        }

        let request = SendSmtpEmail {
            sender: Some(self.sender(email.from.as_deref())),
            to: recipients.iter().map(Contact::from).collect(),
            reply_to: email.reply_to.as_deref().map(Contact::parse),
            subject: Some(email.subject.clone()),
            html_content: non_empty(email.html.as_deref()),
            text_content: non_empty(email.text.as_deref()),
            ..Default::default()
        };

        match self.post_email(client, &request).await {
            Ok(message_id) => {
                info!(recipient_count = recipients.len(), "Bulk email sent via Brevo");
                let summary = BulkSummary {
                    total_recipients: recipients.len(),
                    sent: recipients.len(),
                    failed: 0,
                    results: Vec::new(),
                };
                DeliveryResult::success(
                    DeliverySuccess::new(PROVIDER)
                        .with_message_id(message_id)
                        .with_recipient_count(recipients.len())
                        .with_bulk(summary),
                )
            }
            Err(e) => {
                error!(recipient_count = recipients.len(), error = %e, "Failed to send bulk email via Brevo");
                DeliveryResult::failure(PROVIDER, &e, operation)
            }
        }
    }

    async fn test_connection(&self) -> bool {
        let Some(client) = self.client.as_ref() else {
            return false;
        };

        match self.fetch_account(client).await {
            Ok(()) => {
                info!("Brevo connection test successful");
                true
            }
            Err(e) => {
                error!(error = %e, "Brevo connection test failed");
                false
            }
        }
    }

    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.to_string(),
            initialized: self.initialized,
            has_credentials: self.config.api_key.is_some(),
            features: vec![
                "Transactional emails".to_string(),
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
