//! Configuration for the site API

use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_optional, env_parse_or, server::ServerConfig};
use axum_helpers::http::DEFAULT_TRUSTED_PROXY_HOPS;
use domain_notifications::EmailConfig;
use std::num::NonZeroU32;
use std::path::PathBuf;

pub use core_config::Environment;

const DEV_ORIGINS: [&str; 4] = [
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub email: EmailConfig,
    /// Public origin of the front end in production
    pub frontend_url: Option<String>,
    /// Directory holding the built single-page app
    pub frontend_dist: PathBuf,
    pub contact_rate_limit_per_hour: NonZeroU32,
    /// Only enforced in production
    pub api_rate_limit_per_15_min: NonZeroU32,
    /// Reverse proxies in front of the server; 0 keys rate limits by socket address
    pub trusted_proxy_hops: usize,
}

fn non_zero(key: &str, default: u32) -> Result<NonZeroU32, ConfigError> {
    let value: u32 = env_parse_or(key, default)?;
    NonZeroU32::new(value).ok_or_else(|| ConfigError::ParseError {
        key: key.to_string(),
        details: "must be greater than zero".to_string(),
    })
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            email: EmailConfig::from_env()?,
            frontend_url: env_optional("FRONTEND_URL"),
            frontend_dist: env_optional("FRONTEND_DIST")
                .unwrap_or_else(|| "frontend/dist".to_string())
                .into(),
            contact_rate_limit_per_hour: non_zero("CONTACT_RATE_LIMIT_PER_HOUR", 5)?,
            api_rate_limit_per_15_min: non_zero("API_RATE_LIMIT_PER_15_MIN", 100)?,
            trusted_proxy_hops: env_parse_or("TRUSTED_PROXY_HOPS", DEFAULT_TRUSTED_PROXY_HOPS)?,
        })
    }

    /// Origins allowed to call the API from a browser.
    ///
    /// Local dev servers in development, `FRONTEND_URL` in production.
    pub fn cors_origins(&self) -> Vec<String> {
        if self.environment.is_production() {
            self.frontend_url
                .iter()
                .map(|url| url.trim_end_matches('/').to_string())
                .collect()
        } else {
            DEV_ORIGINS.iter().map(|origin| origin.to_string()).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 7] = [
        "APP_ENV",
        "FRONTEND_URL",
        "FRONTEND_DIST",
        "CONTACT_RATE_LIMIT_PER_HOUR",
        "API_RATE_LIMIT_PER_15_MIN",
        "PORT",
        "TRUSTED_PROXY_HOPS",
    ];

    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let mut all: Vec<(&str, Option<&str>)> = VARS.iter().map(|k| (*k, None)).collect();
        for (key, value) in vars {
            all.retain(|(k, _)| k != key);
            all.push((*key, Some(*value)));
        }
        temp_env::with_vars(all, f);
    }

    #[test]
    fn test_defaults() {
        with_env(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.server.port, 3000);
            assert_eq!(config.frontend_dist, PathBuf::from("frontend/dist"));
            assert_eq!(config.contact_rate_limit_per_hour.get(), 5);
            assert_eq!(config.api_rate_limit_per_15_min.get(), 100);
            assert_eq!(config.trusted_proxy_hops, 1);
            assert_eq!(config.cors_origins().len(), 4);
            assert_eq!(config.app.name, "site_api");
        });
    }

    #[test]
    fn test_production_allows_only_frontend_url() {
        with_env(
            &[("APP_ENV", "production"), ("FRONTEND_URL", "https://aiconsult.example/")],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.cors_origins(), vec!["https://aiconsult.example"]);
            },
        );
    }

    #[test]
    fn test_production_without_frontend_url_allows_nothing() {
        with_env(&[("APP_ENV", "production")], || {
            assert!(Config::from_env().unwrap().cors_origins().is_empty());
        });
    }

    #[test]
    fn test_zero_rate_limit_is_rejected() {
        with_env(&[("CONTACT_RATE_LIMIT_PER_HOUR", "0")], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.to_string().contains("CONTACT_RATE_LIMIT_PER_HOUR"));
        });
    }
}
