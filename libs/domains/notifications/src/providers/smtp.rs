//! SMTP email provider implementation using lettre.
//!
//! Talks to any SMTP relay through a pooled async transport. The transport sits
//! behind [`SmtpTransport`] so delivery logic can be exercised without a server.

use super::{EmailProvider, not_ready, unsupported, with_timeout};
use crate::config::SmtpConfig;
use crate::error::{NotificationError, NotificationResult};
use crate::models::{BulkEmail, EmailMessage, ProviderInfo, Recipient, TemplatedEmail};
use crate::result::{BulkSummary, DeliveryResult, DeliverySuccess, Operation, RecipientStatus};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
        PoolConfig,
    },
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PROVIDER: &str = "SMTP";

/// The wire-level operations the SMTP provider needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmtpTransport: Send + Sync {
    /// Hands a fully built message to the relay.
    async fn send(&self, message: Message) -> NotificationResult<()>;

    /// Opens a connection and completes the SMTP handshake.
    async fn test_connection(&self) -> NotificationResult<bool>;
}

/// Pooled lettre transport.
pub struct LettreTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl LettreTransport {
    /// Builds the transport from configuration.
    ///
    /// `secure` selects implicit TLS; otherwise STARTTLS is used when the server
    /// offers it.
    pub fn build(config: &SmtpConfig) -> NotificationResult<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or_else(|| NotificationError::MissingCredentials("SMTP host is required".to_string()))?;

        let tls_parameters = TlsParameters::builder(host.to_string())
            .dangerous_accept_invalid_certs(!config.reject_unauthorized)
            .build()?;

        let tls = if config.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(config.port)
            .tls(tls)
            .pool_config(PoolConfig::new().max_size(config.pool_size));

        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            inner: builder.build(),
        })
    }
}

#[async_trait]
impl SmtpTransport for LettreTransport {
    async fn send(&self, message: Message) -> NotificationResult<()> {
        self.inner.send(message).await?;
        Ok(())
    }

    async fn test_connection(&self) -> NotificationResult<bool> {
        Ok(self.inner.test_connection().await?)
    }
}

/// SMTP email provider.
pub struct SmtpProvider {
    config: SmtpConfig,
    timeout: Duration,
    transport: Option<Box<dyn SmtpTransport>>,
    initialized: bool,
}

impl SmtpProvider {
    /// Create a provider that builds its lettre transport during `initialize`.
    pub fn new(config: SmtpConfig, timeout: Duration) -> Self {
        Self {
            config,
            timeout,
            transport: None,
            initialized: false,
        }
    }

    /// Create a provider over an existing transport.
    pub fn with_transport(
        config: SmtpConfig,
        timeout: Duration,
        transport: Box<dyn SmtpTransport>,
    ) -> Self {
        Self {
            config,
            timeout,
            transport: Some(transport),
            initialized: false,
        }
    }

    fn ready_transport(&self) -> Option<&dyn SmtpTransport> {
        self.transport.as_deref().filter(|_| self.initialized)
    }

    /// `"<sender_name>" <sender_email or user>`.
    fn default_sender(&self) -> NotificationResult<Mailbox> {
        let email = self
            .config
            .sender_email
            .as_deref()
            .or(self.config.user.as_deref())
            .ok_or_else(|| {
                NotificationError::InvalidConfig("SMTP sender address is not configured".to_string())
            })?;

        Ok(Mailbox::new(
            Some(self.config.sender_name.clone()),
            email.parse::<Address>()?,
        ))
    }

    async fn try_initialize(&mut self) -> NotificationResult<()> {
        if self.config.host.is_none() || !self.config.has_credentials() {
            return Err(NotificationError::MissingCredentials(
                "SMTP host, user, and password are required".to_string(),
            ));
        }

        if self.transport.is_none() {
            self.transport = Some(Box::new(LettreTransport::build(&self.config)?));
        }

        if !self.test_connection().await {
            return Err(NotificationError::Transport(
                "Failed to connect to SMTP server".to_string(),
            ));
        }

        Ok(())
    }

    /// Build a lettre Message from an EmailMessage.
    fn build_message(&self, email: &EmailMessage) -> NotificationResult<Message> {
        let from = match email.from.as_deref() {
            Some(from) => from.parse::<Mailbox>()?,
            None => self.default_sender()?,
        };

        let mut builder = Message::builder()
            .from(from)
            .to(email.to.parse::<Mailbox>()?)
            .subject(email.subject.as_str())
            .message_id(None);

        if let Some(reply_to) = email.reply_to.as_deref() {
            builder = builder.reply_to(reply_to.parse::<Mailbox>()?);
        }
        for cc in &email.cc {
            builder = builder.cc(cc.parse::<Mailbox>()?);
        }
        for bcc in &email.bcc {
            builder = builder.bcc(bcc.parse::<Mailbox>()?);
        }

        let message = match (email.html_body(), email.text_body()) {
            (Some(html), Some(text)) => builder.multipart(MultiPart::alternative_plain_html(
                text.to_string(),
                html.to_string(),
            ))?,
            (Some(html), None) => builder.header(ContentType::TEXT_HTML).body(html.to_string())?,
            (None, Some(text)) => builder.header(ContentType::TEXT_PLAIN).body(text.to_string())?,
            (None, None) => {
                return Err(NotificationError::Validation(vec![
                    "Email content (html or text) is required".to_string(),
                ]));
            }
        };

        Ok(message)
    }

    async fn deliver(&self, transport: &dyn SmtpTransport, email: &EmailMessage) -> NotificationResult<String> {
        let message = self.build_message(email)?;
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());

        with_timeout(self.timeout, transport.send(message)).await?;
        Ok(message_id)
    }
}

#[async_trait]
impl EmailProvider for SmtpProvider {
    async fn initialize(&mut self) -> bool {
        match self.try_initialize().await {
            Ok(()) => {
                self.initialized = true;
                info!(
                    host = ?self.config.host,
                    port = self.config.port,
                    secure = self.config.secure,
                    "SMTP provider initialized"
                );
                true
            }
            Err(e) => {
                self.initialized = false;
                error!(error = %e, "Failed to initialize SMTP provider");
                false
            }
        }
    }

    async fn send_email(&self, email: &EmailMessage) -> DeliveryResult {
        let Some(transport) = self.ready_transport() else {
            return not_ready(PROVIDER, Operation::SendEmail);
        };

        if let Err(e) = self.validate(email) {
            warn!(to = %email.to, error = %e, "Rejected invalid email");
            return DeliveryResult::failure(PROVIDER, &e, Operation::Validation);
        }

        debug!(
            to = %email.to,
            subject = %email.subject,
            host = ?self.config.host,
            port = self.config.port,
            cc_count = email.cc.len(),
            bcc_count = email.bcc.len(),
            has_reply_to = email.reply_to.is_some(),
            "Sending email via SMTP"
        );

        match self.deliver(transport, email).await {
            Ok(message_id) => {
                info!(to = %email.to, message_id = %message_id, "Email sent via SMTP");
                DeliveryResult::success(
                    DeliverySuccess::new(PROVIDER)
                        .with_message_id(message_id)
                        .with_to(&email.to)
                        .with_subject(&email.subject),
                )
            }
            Err(e) => {
                error!(to = %email.to, error = %e, "Failed to send email via SMTP");
                DeliveryResult::failure(PROVIDER, &e, Operation::SendEmail)
            }
        }
    }

    async fn send_templated_email(&self, email: &TemplatedEmail) -> DeliveryResult {
        if self.ready_transport().is_none() {
            return not_ready(PROVIDER, Operation::SendTemplatedEmail);
        }
        warn!(template_id = %email.template_id, "Templated email is not supported over SMTP");
        unsupported(
            PROVIDER,
            Operation::SendTemplatedEmail,
            "Template loading not implemented",
        )
    }

    async fn send_bulk_email(&self, recipients: &[Recipient], email: &BulkEmail) -> DeliveryResult {
        let operation = Operation::SendBulkEmail;
        if self.ready_transport().is_none() {
            return not_ready(PROVIDER, operation);
        }
        if recipients.is_empty() {
            return DeliveryResult::failure(PROVIDER, &NotificationError::EmptyRecipients, operation);
        }

        let mut summary = BulkSummary::new(recipients.len());
        for (index, recipient) in recipients.iter().enumerate() {
            let address = recipient.address();
            let status = if self.send_email(&email.for_recipient(address)).await.is_success() {
                RecipientStatus::Sent
            } else {
                RecipientStatus::Failed
            };
            summary.record(address, status);

            let last = index + 1 == recipients.len();
            if !last && !self.config.bulk_send_delay.is_zero() {
                tokio::time::sleep(self.config.bulk_send_delay).await;
            }
        }

        info!(
            total_recipients = summary.total_recipients,
            sent = summary.sent,
            failed = summary.failed,
            "Bulk email completed via SMTP"
        );

        DeliveryResult::from_bulk(PROVIDER, summary)
    }

    async fn test_connection(&self) -> bool {
        let Some(transport) = self.transport.as_deref() else {
            return false;
        };

        match with_timeout(self.timeout, transport.test_connection()).await {
            Ok(true) => {
                info!("SMTP connection test successful");
                true
            }
            Ok(false) => {
                error!("SMTP connection test failed: server did not accept the handshake");
                false
            }
            Err(e) => {
                error!(error = %e, "SMTP connection test failed");
                false
            }
        }
    }

    fn describe(&self) -> ProviderInfo {
        ProviderInfo {
            name: PROVIDER.to_string(),
            initialized: self.initialized,
            has_credentials: self.config.user.is_some(),
            features: vec![
                "SMTP support".to_string(),
                "HTML/Text emails".to_string(),
                "Bulk emails".to_string(),
            ],
            details: Some(serde_json::json!({
                "host": self.config.host,
                "port": self.config.port,
            })),
        }
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use std::sync::{Arc, Mutex};

    fn config() -> SmtpConfig {
        SmtpConfig::new("smtp.example.com", "mailer@example.com", "secret")
            .with_bulk_send_delay(Duration::ZERO)
    }

    fn reachable_transport() -> MockSmtpTransport {
        let mut transport = MockSmtpTransport::new();
        transport.expect_test_connection().returning(|| Ok(true));
        transport
    }

    async fn ready_provider(transport: MockSmtpTransport) -> SmtpProvider {
        let mut provider =
            SmtpProvider::with_transport(config(), Duration::from_secs(5), Box::new(transport));
        assert!(provider.initialize().await);
        provider
    }

    fn first_recipient(message: &Message) -> String {
        message.envelope().to()[0].to_string()
    }

    #[tokio::test]
    async fn test_initialize_requires_credentials() {
        let mut transport = MockSmtpTransport::new();
        transport.expect_test_connection().never();

        let mut provider = SmtpProvider::with_transport(
            SmtpConfig::default(),
            Duration::from_secs(1),
            Box::new(transport),
        );
        assert!(!provider.initialize().await);
    }

    #[tokio::test]
    async fn test_initialize_fails_when_handshake_fails() {
        let mut transport = MockSmtpTransport::new();
        transport
            .expect_test_connection()
            .returning(|| Err(NotificationError::Transport("connection refused".into())));

        let mut provider =
            SmtpProvider::with_transport(config(), Duration::from_secs(1), Box::new(transport));
        assert!(!provider.initialize().await);
        assert!(!provider.describe().initialized);
    }

    #[tokio::test]
    async fn test_invalid_message_makes_no_transport_call() {
        let mut transport = reachable_transport();
        transport.expect_send().never();
        let provider = ready_provider(transport).await;

        let result = provider
            .send_email(&EmailMessage::new("not-an-email", "").with_text(""))
            .await;

        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Email validation failed"));
        assert_eq!(result.kind(), Some(FailureKind::Validation));
        let details = result.details().unwrap();
        assert!(details.contains("Invalid recipient email format"));
        assert!(details.contains("Email subject is required"));
        assert!(details.contains("Email content (html or text) is required"));
    }

    #[tokio::test]
    async fn test_valid_message_echoes_recipient_and_subject() {
        let mut transport = reachable_transport();
        transport.expect_send().times(1).returning(|_| Ok(()));
        let provider = ready_provider(transport).await;

        let result = provider
            .send_email(
                &EmailMessage::new("ada@example.com", "Engines")
                    .with_html("<p>Hello</p>")
                    .with_text("Hello"),
            )
            .await;

        assert!(result.is_success());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["to"], "ada@example.com");
        assert_eq!(json["subject"], "Engines");
        assert_eq!(json["provider"], "SMTP");
        assert!(result.message_id().is_some());
    }

    #[tokio::test]
    async fn test_message_headers() {
        let captured: Arc<Mutex<Option<String>>> = Arc::default();
        let sink = Arc::clone(&captured);

        let mut transport = reachable_transport();
        transport.expect_send().times(1).returning(move |message| {
            let raw = String::from_utf8_lossy(&message.formatted()).to_string();
            *sink.lock().unwrap() = Some(raw);
            Ok(())
        });
        let provider = ready_provider(transport).await;

        let result = provider
            .send_email(
                &EmailMessage::new("ada@example.com", "Engines")
                    .with_text("Hello")
                    .with_reply_to("visitor@example.com"),
            )
            .await;
        assert!(result.is_success());

        let raw = captured.lock().unwrap().clone().unwrap();
        assert!(raw.contains("From: "));
        assert!(raw.contains("AI Consult"));
        assert!(raw.contains("<mailer@example.com>"));
        assert!(raw.contains("Reply-To: "));
        assert!(raw.contains("visitor@example.com"));
        assert!(raw.contains("Subject: Engines"));
        assert!(raw.contains("Message-ID: "));
    }

    #[tokio::test]
    async fn test_transport_error_is_a_send_failure() {
        let mut transport = reachable_transport();
        transport
            .expect_send()
            .returning(|_| Err(NotificationError::Transport("SMTP error: 550 mailbox unavailable".into())));
        let provider = ready_provider(transport).await;

        let result = provider
            .send_email(&EmailMessage::new("ada@example.com", "Hi").with_text("x"))
            .await;

        assert_eq!(result.error(), Some("Send email failed"));
        assert_eq!(result.kind(), Some(FailureKind::Transport));
        assert!(result.details().unwrap().contains("550"));
    }

    #[tokio::test]
    async fn test_bulk_with_empty_list_makes_no_transport_call() {
        let mut transport = reachable_transport();
        transport.expect_send().never();
        let provider = ready_provider(transport).await;

        let result = provider
            .send_bulk_email(&[], &BulkEmail::new("News").with_text("Hi"))
            .await;

        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Send bulk email failed"));
        assert_eq!(result.details(), Some("Recipients list is required"));
    }

    #[tokio::test]
    async fn test_bulk_continues_past_failures() {
        let attempts: Arc<Mutex<Vec<String>>> = Arc::default();
        let log = Arc::clone(&attempts);

        let mut transport = reachable_transport();
        transport.expect_send().times(3).returning(move |message| {
            let to = first_recipient(&message);
            log.lock().unwrap().push(to.clone());
            if to == "b@example.com" {
                Err(NotificationError::Transport("SMTP error: 550".into()))
            } else {
                Ok(())
            }
        });
        let provider = ready_provider(transport).await;

        let recipients = vec![
            Recipient::from("a@example.com"),
            Recipient::from("b@example.com"),
            Recipient::Named {
                email: "c@example.com".to_string(),
                name: Some("Cy".to_string()),
            },
        ];
        let result = provider
            .send_bulk_email(&recipients, &BulkEmail::new("News").with_text("Hi"))
            .await;

        assert!(result.is_success());
        let bulk = result.bulk().unwrap();
        assert_eq!(bulk.total_recipients, 3);
        assert_eq!(bulk.sent, 2);
        assert_eq!(bulk.failed, 1);
        assert_eq!(bulk.results[1].status, RecipientStatus::Failed);
        assert_eq!(
            *attempts.lock().unwrap(),
            vec!["a@example.com", "b@example.com", "c@example.com"]
        );
    }

    #[tokio::test]
    async fn test_bulk_where_every_send_fails() {
        let mut transport = reachable_transport();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Err(NotificationError::Transport("SMTP error: 550".into())));
        let provider = ready_provider(transport).await;

        let recipients = [Recipient::from("a@example.com"), Recipient::from("b@example.com")];
        let result = provider
            .send_bulk_email(&recipients, &BulkEmail::new("News").with_text("Hi"))
            .await;

        assert!(!result.is_success());
        assert_eq!(result.error(), Some("Send bulk email failed"));
        assert_eq!(result.details(), Some("All 2 recipients failed"));
        let bulk = result.bulk().unwrap();
        assert_eq!((bulk.sent, bulk.failed), (0, 2));
    }

    #[tokio::test]
    async fn test_templated_email_is_unsupported() {
        let provider = ready_provider(reachable_transport()).await;

        let result = provider
            .send_templated_email(&TemplatedEmail::new("ada@example.com", "welcome"))
            .await;

        assert_eq!(result.error(), Some("Send templated email failed"));
        assert_eq!(result.details(), Some("Template loading not implemented"));
        assert_eq!(result.kind(), Some(FailureKind::Unsupported));
    }

    #[tokio::test]
    async fn test_uninitialized_provider_is_not_ready() {
        let provider = SmtpProvider::new(config(), Duration::from_secs(1));

        let result = provider
            .send_email(&EmailMessage::new("ada@example.com", "Hi").with_text("x"))
            .await;
        assert_eq!(result.details(), Some("SMTP provider not initialized"));
        assert!(!provider.test_connection().await);

        let templated = provider
            .send_templated_email(&TemplatedEmail::new("ada@example.com", "welcome"))
            .await;
        assert_eq!(templated.kind(), Some(FailureKind::NotReady));
    }

    #[test]
    fn test_describe_reports_host_and_port() {
        let provider = SmtpProvider::new(config(), Duration::from_secs(1));
        let info = provider.describe();

        assert_eq!(info.name, "SMTP");
        assert!(info.has_credentials);
        assert_eq!(
            info.details,
            Some(serde_json::json!({"host": "smtp.example.com", "port": 587}))
        );
    }

    #[tokio::test]
    async fn test_lettre_transport_builds_for_both_tls_modes() {
        assert!(LettreTransport::build(&config()).is_ok());

        let mut implicit = config();
        implicit.secure = true;
        implicit.port = 465;
        implicit.reject_unauthorized = false;
        assert!(LettreTransport::build(&implicit).is_ok());
    }
}
