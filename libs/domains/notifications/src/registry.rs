//! Named provider recipes and primary/fallback selection.

use crate::config::{BrevoConfig, EmailConfig, MockConfig, SmtpConfig};
use crate::error::{NotificationError, NotificationResult};
use crate::providers::{BrevoProvider, EmailProvider, MockProvider, SmtpProvider};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How to construct one provider.
#[derive(Debug, Clone)]
pub enum ProviderSpec {
    Brevo(BrevoConfig),
    Smtp(SmtpConfig),
    Mock(MockConfig),
}

impl ProviderSpec {
    /// Builds an uninitialized provider.
    pub fn build(&self, send_timeout: Duration) -> Box<dyn EmailProvider> {
        match self {
            ProviderSpec::Brevo(config) => Box::new(BrevoProvider::new(config.clone(), send_timeout)),
            ProviderSpec::Smtp(config) => Box::new(SmtpProvider::new(config.clone(), send_timeout)),
            ProviderSpec::Mock(config) => Box::new(MockProvider::new(config.clone())),
        }
    }
}

/// Provider name to construction recipe. Populated at startup.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: HashMap<String, ProviderSpec>,
    send_timeout: Duration,
}

impl ProviderRegistry {
    pub fn new(send_timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            send_timeout,
        }
    }

    /// Registers `brevo`, `smtp` (also as `nodemailer`) and, when configured,
    /// `mock`.
    pub fn from_config(config: &EmailConfig) -> Self {
        let mut registry = Self::new(config.send_timeout);
        registry.register("brevo", ProviderSpec::Brevo(config.brevo.clone()));
        registry.register("smtp", ProviderSpec::Smtp(config.smtp.clone()));
        registry.register("nodemailer", ProviderSpec::Smtp(config.smtp.clone()));
        if let Some(mock) = &config.mock {
            registry.register("mock", ProviderSpec::Mock(mock.clone()));
        }
        registry
    }

    /// Adds or replaces an entry.
    pub fn register(&mut self, name: impl Into<String>, spec: ProviderSpec) -> &mut Self {
        self.entries.insert(name.into().to_ascii_lowercase(), spec);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Builds and initializes the named provider.
    pub async fn initialize_provider(&self, name: &str) -> NotificationResult<Arc<dyn EmailProvider>> {
        let spec = self
            .entries
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| NotificationError::UnknownProvider(name.to_string()))?;

        let mut provider = spec.build(self.send_timeout);
        if provider.initialize().await {
            info!(provider = name, "Email provider ready");
            Ok(Arc::from(provider))
        } else {
            Err(NotificationError::InitializationFailed(name.to_string()))
        }
    }

    /// Tries `primary`, then `fallback` when configured. Failures are logged.
    pub async fn select(
        &self,
        primary: &str,
        fallback: Option<&str>,
    ) -> Option<Arc<dyn EmailProvider>> {
        let primary_error = match self.initialize_provider(primary).await {
            Ok(provider) => return Some(provider),
            Err(e) => e,
        };

        let Some(fallback) = fallback else {
            error!(provider = primary, error = %primary_error, "Email provider failed to initialize");
            return None;
        };

        warn!(
            primary = primary,
            fallback = fallback,
            error = %primary_error,
            "Primary email provider failed, trying fallback"
        );

        match self.initialize_provider(fallback).await {
            Ok(provider) => Some(provider),
            Err(e) => {
                error!(
                    primary = primary,
                    fallback = fallback,
                    error = %e,
                    "Both email providers failed to initialize"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new(Duration::from_secs(1));
        registry
            .register("mock", ProviderSpec::Mock(MockConfig::default()))
            .register("broken", ProviderSpec::Mock(MockConfig::failing_initialization()));
        registry
    }

    #[test]
    fn test_from_config_registers_all_backends() {
        let registry = ProviderRegistry::from_config(&EmailConfig::default());
        assert_eq!(registry.names(), vec!["brevo", "mock", "nodemailer", "smtp"]);
        assert!(registry.contains("SMTP"));
    }

    #[tokio::test]
    async fn test_mock_is_unknown_when_not_configured() {
        let config = EmailConfig {
            mock: None,
            ..EmailConfig::default().with_provider("mock")
        };
        let registry = ProviderRegistry::from_config(&config);

        assert!(!registry.contains("mock"));
        let err = registry.initialize_provider("mock").await.err().unwrap();
        assert!(matches!(err, NotificationError::UnknownProvider(_)));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_a_configuration_error() {
        let err = registry().initialize_provider("ses").await.err().unwrap();
        assert!(matches!(err, NotificationError::UnknownProvider(_)));
        assert_eq!(err.to_string(), "Unknown email provider: ses");
    }

    #[tokio::test]
    async fn test_failed_initialization_is_reported() {
        let err = registry().initialize_provider("broken").await.err().unwrap();
        assert!(matches!(err, NotificationError::InitializationFailed(_)));
    }

    #[tokio::test]
    async fn test_select_falls_back_when_primary_fails() {
        let provider = registry().select("broken", Some("mock")).await.unwrap();
        assert_eq!(provider.name(), "Mock");
        assert!(provider.describe().initialized);
    }

    #[tokio::test]
    async fn test_select_without_fallback() {
        assert!(registry().select("broken", None).await.is_none());
        assert!(registry().select("broken", Some("ses")).await.is_none());
        assert!(registry().select("mock", Some("broken")).await.is_some());
    }

    #[tokio::test]
    async fn test_brevo_without_key_fails_before_network() {
        let registry = ProviderRegistry::from_config(&EmailConfig::default());
        assert!(registry.initialize_provider("brevo").await.is_err());
    }
}
