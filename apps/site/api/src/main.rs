//! AI Consult website server - contact form API and static front end

use axum_helpers::create_app;
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::EmailService;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        "Starting {} v{} ({:?})",
        config.app.name, config.app.version, config.environment
    );

    // Email provider setup runs in the background so the server starts immediately
    let email = Arc::new(EmailService::new(&config.email));
    {
        let email = email.clone();
        tokio::spawn(async move {
            if email.initialize().await {
                info!(
                    "Email service ready using {}",
                    email.active_provider_name().unwrap_or("unknown provider")
                );
            } else {
                warn!("Email service not configured - contact form will not work");
            }
        });
    }

    let state = AppState::new(config, email);

    {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                state.prune_rate_limits();
            }
        });
    }

    let router = api::app(&state)?;

    info!("Listening on {}", state.config.server.address());
    create_app(router, &state.config.server)
        .await
        .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Server shutdown complete");
    Ok(())
}
