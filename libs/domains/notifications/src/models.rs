//! Domain models for outbound email.

use crate::address::is_valid_email;
use crate::error::{NotificationError, NotificationResult};
use serde::{Deserialize, Serialize};

/// A single, individually addressed email.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Sender override; plain address or `Display Name <addr>`.
    #[serde(default)]
    pub from: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
}

impl EmailMessage {
    /// Create a new email with required fields
    pub fn new(to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            ..Default::default()
        }
    }

    /// Set HTML body
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Set plain text body
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc.push(cc.into());
        self
    }

    pub fn with_bcc(mut self, bcc: impl Into<String>) -> Self {
        self.bcc.push(bcc.into());
        self
    }

    /// HTML body, treating an empty string as absent.
    pub fn html_body(&self) -> Option<&str> {
        self.html.as_deref().filter(|s| !s.is_empty())
    }

    /// Text body, treating an empty string as absent.
    pub fn text_body(&self) -> Option<&str> {
        self.text.as_deref().filter(|s| !s.is_empty())
    }

    /// Checks the message invariants, reporting every violation at once.
    pub fn validate(&self) -> NotificationResult<()> {
        let mut errors = Vec::new();

        if self.to.trim().is_empty() {
            errors.push("Recipient email (to) is required".to_string());
        } else if !is_valid_email(&self.to) {
            errors.push("Invalid recipient email format".to_string());
        }

        if self.subject.trim().is_empty() {
            errors.push("Email subject is required".to_string());
        }

        if self.html_body().is_none() && self.text_body().is_none() {
            errors.push("Email content (html or text) is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::Validation(errors))
        }
    }
}

/// Shared content of a bulk send: an [`EmailMessage`] without its recipient.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkEmail {
    #[serde(default)]
    pub from: Option<String>,
    pub subject: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl BulkEmail {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Checks the shared content and every recipient address in one pass,
    /// using the same rules as [`EmailMessage::validate`].
    pub fn validate(&self, recipients: &[Recipient]) -> NotificationResult<()> {
        if recipients.is_empty() {
            return Err(NotificationError::EmptyRecipients);
        }

        let mut errors = Vec::new();

        for recipient in recipients {
            let address = recipient.address();
            if address.trim().is_empty() {
                errors.push("Recipient email (to) is required".to_string());
            } else if !is_valid_email(address) {
                errors.push(format!("Invalid recipient email format: {}", address));
            }
        }

        if self.subject.trim().is_empty() {
            errors.push("Email subject is required".to_string());
        }

        let has_content = [&self.html, &self.text]
            .iter()
            .any(|body| body.as_deref().is_some_and(|s| !s.is_empty()));
        if !has_content {
            errors.push("Email content (html or text) is required".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(NotificationError::Validation(errors))
        }
    }

    /// Expands the shared content into a message for one recipient.
    pub fn for_recipient(&self, to: &str) -> EmailMessage {
        EmailMessage {
            to: to.to_string(),
            from: self.from.clone(),
            subject: self.subject.clone(),
            html: self.html.clone(),
            text: self.text.clone(),
            reply_to: self.reply_to.clone(),
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }
}

/// A bulk-send recipient: a bare address or an `{email, name}` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipient {
    Address(String),
    Named {
        email: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl Recipient {
    pub fn address(&self) -> &str {
        match self {
            Self::Address(email) | Self::Named { email, .. } => email,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Address(_) => None,
            Self::Named { name, .. } => name.as_deref(),
        }
    }
}

impl From<&str> for Recipient {
    fn from(email: &str) -> Self {
        Self::Address(email.to_string())
    }
}

/// A provider-side template send.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplatedEmail {
    pub to: String,
    pub template_id: String,
    /// Template parameters, normally a JSON object.
    #[serde(default)]
    pub variables: serde_json::Value,
    #[serde(default)]
    pub from: Option<String>,
}

impl TemplatedEmail {
    pub fn new(to: impl Into<String>, template_id: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            template_id: template_id.into(),
            variables: serde_json::Value::Object(Default::default()),
            from: None,
        }
    }

    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }

    /// `to` and `template_id` are the only hard requirements.
    pub fn validate(&self) -> NotificationResult<()> {
        if self.to.trim().is_empty() {
            return Err(NotificationError::MissingField("Recipient email"));
        }
        if self.template_id.trim().is_empty() {
            return Err(NotificationError::MissingField("Template ID"));
        }
        Ok(())
    }
}

/// A contact-form submission, already trimmed and sanitized by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub service: Option<String>,
    pub message: String,
}

impl ContactForm {
    pub fn company(&self) -> Option<&str> {
        self.company.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Read-only description of a provider instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub initialized: bool,
    pub has_credentials: bool,
    pub features: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}
