//! Provider configuration loaded once from the environment.

use crate::providers::Outbox;
use core_config::{
    env_flag, env_optional, env_or_default, env_parse_or, ConfigError, Environment, FromEnv,
};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_SENDER_NAME: &str = "AI Consult";
pub const DEFAULT_SENDER_EMAIL: &str = "noreply@example.com";
pub const DEFAULT_BREVO_API_URL: &str = "https://api.brevo.com/v3";

const REDACTED: &str = "[REDACTED]";

/// Brevo transactional API settings.
#[derive(Clone)]
pub struct BrevoConfig {
    pub api_key: Option<String>,
    pub sender_name: String,
    pub sender_email: String,
    /// Base URL without trailing slash, overridable for tests.
    pub api_url: String,
}

impl Default for BrevoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            sender_email: DEFAULT_SENDER_EMAIL.to_string(),
            api_url: DEFAULT_BREVO_API_URL.to_string(),
        }
    }
}

impl BrevoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl FromEnv for BrevoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let sender_name = env_optional("BREVO_SENDER_NAME")
            .or_else(|| env_optional("APP_NAME"))
            .unwrap_or_else(|| DEFAULT_SENDER_NAME.to_string());

        Ok(Self {
            api_key: env_optional("BREVO_API_KEY"),
            sender_name,
            sender_email: env_or_default("BREVO_SENDER_EMAIL", DEFAULT_SENDER_EMAIL),
            api_url: env_or_default("BREVO_API_URL", DEFAULT_BREVO_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

impl fmt::Debug for BrevoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrevoConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| REDACTED))
            .field("sender_name", &self.sender_name)
            .field("sender_email", &self.sender_email)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// SMTP relay settings.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    /// Implicit TLS on connect. When false, STARTTLS is used if offered.
    pub secure: bool,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sender_name: String,
    /// Defaults to `user` when unset.
    pub sender_email: Option<String>,
    /// When false, invalid server certificates are accepted.
    pub reject_unauthorized: bool,
    pub pool_size: u32,
    /// Pause between sequential bulk sends. Zero disables it.
    pub bulk_send_delay: Duration,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            secure: false,
            user: None,
            password: None,
            sender_name: DEFAULT_SENDER_NAME.to_string(),
            sender_email: None,
            reject_unauthorized: true,
            pool_size: 5,
            bulk_send_delay: Duration::from_millis(100),
        }
    }
}

impl SmtpConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: Some(host.into()),
            user: Some(user.into()),
            password: Some(password.into()),
            ..Default::default()
        }
    }

    pub fn with_bulk_send_delay(mut self, delay: Duration) -> Self {
        self.bulk_send_delay = delay;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.user.is_some() && self.password.is_some()
    }
}

impl FromEnv for SmtpConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: env_optional("SMTP_HOST"),
            port: env_parse_or("SMTP_PORT", defaults.port)?,
            secure: env_flag("SMTP_SECURE", false),
            user: env_optional("SMTP_USER"),
            password: env_optional("SMTP_PASS"),
            sender_name: env_or_default("SMTP_SENDER_NAME", DEFAULT_SENDER_NAME),
            sender_email: env_optional("SMTP_SENDER_EMAIL"),
            reject_unauthorized: env_flag("SMTP_TLS_REJECT_UNAUTHORIZED", true),
            pool_size: env_parse_or("SMTP_POOL_SIZE", defaults.pool_size)?,
            bulk_send_delay: Duration::from_millis(env_parse_or(
                "EMAIL_BULK_SEND_DELAY_MS",
                defaults.bulk_send_delay.as_millis() as u64,
            )?),
        })
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .field("sender_name", &self.sender_name)
            .field("sender_email", &self.sender_email)
            .field("reject_unauthorized", &self.reject_unauthorized)
            .field("pool_size", &self.pool_size)
            .field("bulk_send_delay", &self.bulk_send_delay)
            .finish()
    }
}

/// Behavior switches for the in-memory provider.
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub fail_initialize: bool,
    /// Sends to these addresses fail with a transport error.
    pub failing_recipients: Vec<String>,
    /// Result reported by the connection check.
    pub connection_ok: bool,
    pub bulk_send_delay: Duration,
    /// Where accepted messages are recorded. Clones share the same outbox.
    pub outbox: Outbox,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            fail_initialize: false,
            failing_recipients: Vec::new(),
            connection_ok: true,
            bulk_send_delay: Duration::ZERO,
            outbox: Outbox::default(),
        }
    }
}

impl MockConfig {
    pub fn failing_initialization() -> Self {
        Self {
            fail_initialize: true,
            ..Default::default()
        }
    }

    pub fn with_failing_recipient(mut self, email: impl Into<String>) -> Self {
        self.failing_recipients.push(email.into());
        self
    }
}

/// Everything the email service needs: provider choice, backends, and the
/// contact-form destination.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub provider: String,
    pub fallback_provider: Option<String>,
    pub brevo: BrevoConfig,
    pub smtp: SmtpConfig,
    /// In-memory backend; `None` in production so it can never be selected there.
    pub mock: Option<MockConfig>,
    pub contact_recipient: Option<String>,
    /// Upper bound on any single transport call.
    pub send_timeout: Duration,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            provider: "brevo".to_string(),
            fallback_provider: None,
            brevo: BrevoConfig::default(),
            smtp: SmtpConfig::default(),
            mock: Some(MockConfig::default()),
            contact_recipient: None,
            send_timeout: Duration::from_secs(30),
        }
    }
}

impl EmailConfig {
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback_provider = Some(fallback.into());
        self
    }

    pub fn with_contact_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.contact_recipient = Some(recipient.into());
        self
    }
}

impl FromEnv for EmailConfig {
    /// Reads `EMAIL_PROVIDER` (default `brevo`), `EMAIL_FALLBACK_PROVIDER`,
    /// `EMAIL_SEND_TIMEOUT_SECS` (default 30) and `CONTACT_FORM_RECIPIENT`
    /// (falling back to `ADMIN_REPORT_EMAIL`), plus the per-backend settings.
    /// The mock backend is left out when `APP_ENV` is production.
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: u64 = env_parse_or("EMAIL_SEND_TIMEOUT_SECS", 30)?;

        Ok(Self {
            provider: env_or_default("EMAIL_PROVIDER", "brevo").to_ascii_lowercase(),
            fallback_provider: env_optional("EMAIL_FALLBACK_PROVIDER")
                .map(|p| p.to_ascii_lowercase()),
            brevo: BrevoConfig::from_env()?,
            smtp: SmtpConfig::from_env()?,
            mock: (!Environment::from_env().is_production()).then(MockConfig::default),
            contact_recipient: env_optional("CONTACT_FORM_RECIPIENT")
                .or_else(|| env_optional("ADMIN_REPORT_EMAIL")),
            send_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMAIL_VARS: [&str; 21] = [
        "APP_ENV",
        "EMAIL_PROVIDER",
        "EMAIL_FALLBACK_PROVIDER",
        "EMAIL_SEND_TIMEOUT_SECS",
        "EMAIL_BULK_SEND_DELAY_MS",
        "CONTACT_FORM_RECIPIENT",
        "ADMIN_REPORT_EMAIL",
        "BREVO_API_KEY",
        "BREVO_SENDER_NAME",
        "BREVO_SENDER_EMAIL",
        "BREVO_API_URL",
        "APP_NAME",
        "SMTP_HOST",
        "SMTP_PORT",
        "SMTP_SECURE",
        "SMTP_USER",
        "SMTP_PASS",
        "SMTP_SENDER_NAME",
        "SMTP_SENDER_EMAIL",
        "SMTP_TLS_REJECT_UNAUTHORIZED",
        "SMTP_POOL_SIZE",
    ];

    fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
        EMAIL_VARS.iter().map(|k| (*k, None)).collect()
    }

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars(unset_all(), || {
            let config = EmailConfig::from_env().unwrap();
            assert_eq!(config.provider, "brevo");
            assert_eq!(config.fallback_provider, None);
            assert_eq!(config.contact_recipient, None);
            assert_eq!(config.send_timeout, Duration::from_secs(30));
            assert_eq!(config.brevo.sender_name, "AI Consult");
            assert_eq!(config.brevo.sender_email, "noreply@example.com");
            assert_eq!(config.brevo.api_url, "https://api.brevo.com/v3");
            assert_eq!(config.smtp.port, 587);
            assert!(!config.smtp.secure);
            assert!(config.smtp.reject_unauthorized);
            assert_eq!(config.smtp.pool_size, 5);
            assert_eq!(config.smtp.bulk_send_delay, Duration::from_millis(100));
        });
    }

    #[test]
    fn test_mock_backend_only_outside_production() {
        temp_env::with_vars(unset_all(), || {
            assert!(EmailConfig::from_env().unwrap().mock.is_some());
        });

        let mut vars = unset_all();
        vars.push(("APP_ENV", Some("production")));
        temp_env::with_vars(vars, || {
            assert!(EmailConfig::from_env().unwrap().mock.is_none());
        });
    }

    #[test]
    fn test_contact_recipient_falls_back_to_admin_email() {
        let mut vars = unset_all();
        vars.push(("ADMIN_REPORT_EMAIL", Some("admin@example.com")));
        temp_env::with_vars(vars, || {
            let config = EmailConfig::from_env().unwrap();
            assert_eq!(config.contact_recipient.as_deref(), Some("admin@example.com"));
        });

        let mut vars = unset_all();
        vars.push(("ADMIN_REPORT_EMAIL", Some("admin@example.com")));
        vars.push(("CONTACT_FORM_RECIPIENT", Some("sales@example.com")));
        temp_env::with_vars(vars, || {
            let config = EmailConfig::from_env().unwrap();
            assert_eq!(config.contact_recipient.as_deref(), Some("sales@example.com"));
        });
    }

    #[test]
    fn test_brevo_sender_name_falls_back_to_app_name() {
        let mut vars = unset_all();
        vars.push(("APP_NAME", Some("Acme")));
        temp_env::with_vars(vars, || {
            let config = BrevoConfig::from_env().unwrap();
            assert_eq!(config.sender_name, "Acme");
        });
    }

    #[test]
    fn test_smtp_settings_parse() {
        let mut vars = unset_all();
        vars.extend([
            ("SMTP_HOST", Some("smtp.example.com")),
            ("SMTP_PORT", Some("465")),
            ("SMTP_SECURE", Some("true")),
            ("SMTP_USER", Some("mailer")),
            ("SMTP_PASS", Some("hunter2")),
            ("SMTP_TLS_REJECT_UNAUTHORIZED", Some("false")),
            ("EMAIL_BULK_SEND_DELAY_MS", Some("0")),
            ("EMAIL_PROVIDER", Some("SMTP")),
            ("EMAIL_FALLBACK_PROVIDER", Some("Brevo")),
        ]);
        temp_env::with_vars(vars, || {
            let config = EmailConfig::from_env().unwrap();
            assert_eq!(config.provider, "smtp");
            assert_eq!(config.fallback_provider.as_deref(), Some("brevo"));
            assert_eq!(config.smtp.host.as_deref(), Some("smtp.example.com"));
            assert_eq!(config.smtp.port, 465);
            assert!(config.smtp.secure);
            assert!(config.smtp.has_credentials());
            assert!(!config.smtp.reject_unauthorized);
            assert_eq!(config.smtp.bulk_send_delay, Duration::ZERO);
        });
    }

    #[test]
    fn test_invalid_port_is_an_error() {
        let mut vars = unset_all();
        vars.push(("SMTP_PORT", Some("smtp")));
        temp_env::with_vars(vars, || {
            let err = EmailConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("SMTP_PORT"));
        });
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let brevo = BrevoConfig::new("xkeysib-secret");
        let smtp = SmtpConfig::new("smtp.example.com", "mailer", "hunter2");

        let rendered = format!("{:?} {:?}", brevo, smtp);
        assert!(!rendered.contains("xkeysib-secret"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
        assert!(rendered.contains("mailer"));
    }
}
