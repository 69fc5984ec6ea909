//! Application state management

use axum_helpers::RateLimit;
use domain_contact::handlers::contact_rate_limit;
use domain_notifications::EmailService;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;

const API_RATE_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub email: Arc<EmailService>,
    pub contact_limit: RateLimit,
    /// Production only
    pub api_limit: Option<RateLimit>,
}

impl AppState {
    pub fn new(config: Config, email: Arc<EmailService>) -> Self {
        let hops = config.trusted_proxy_hops;
        let contact_limit =
            contact_rate_limit(config.contact_rate_limit_per_hour).with_trusted_proxy_hops(hops);
        let api_limit = if config.environment.is_production() {
            RateLimit::per_window(config.api_rate_limit_per_15_min, API_RATE_WINDOW).map(|limit| {
                limit
                    .with_rejection("Too many requests", "Please try again later")
                    .with_trusted_proxy_hops(hops)
            })
        } else {
            None
        };

        Self {
            config,
            email,
            contact_limit,
            api_limit,
        }
    }

    fn rate_limits(&self) -> impl Iterator<Item = &RateLimit> {
        std::iter::once(&self.contact_limit).chain(self.api_limit.as_ref())
    }

    /// Forgets clients whose quota has fully replenished.
    pub fn prune_rate_limits(&self) {
        self.rate_limits().for_each(RateLimit::retain_recent);
    }
}
