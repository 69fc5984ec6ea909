//! API routes module

pub mod email;
pub mod info;

use axum::{Router, middleware, routing::get};
use axum_helpers::{
    ComponentStatus, apply_common_layers, create_cors_layer, create_router,
    errors::handlers::method_not_allowed, health_router, rate_limit,
};
use domain_contact::{ContactService, handlers as contact};
use serde_json::{Map, json};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};

use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Create all `/api` routes
pub fn routes(state: &AppState) -> Router {
    let contact_routes = contact::router(
        ContactService::new(state.email.clone()),
        state.contact_limit.clone(),
    );

    let mut router = Router::new().route("/", get(info::api_info));
    if !state.config.environment.is_production() {
        router = router.route("/email/status", get(email::email_status));
    }

    let router = router
        .with_state(state.clone())
        .nest("/contact", contact_routes)
        .method_not_allowed_fallback(method_not_allowed);

    match &state.api_limit {
        Some(limit) => router.layer(middleware::from_fn_with_state(limit.clone(), rate_limit)),
        None => router,
    }
}

/// The whole site: API, docs, health and the single-page front end.
pub fn app(state: &AppState) -> eyre::Result<Router> {
    let email = state.email.clone();
    let components: ComponentStatus =
        Arc::new(move || Map::from_iter([("email".to_string(), json!(email.state()))]));

    let dist = &state.config.frontend_dist;
    // Unknown paths get index.html so client-side routing works.
    let static_files = ServeDir::new(dist).fallback(ServeFile::new(dist.join("index.html")));

    let router = create_router::<ApiDoc>(routes(state))
        .merge(health_router(state.config.app, components))
        .fallback_service(static_files);

    let cors = create_cors_layer(state.config.cors_origins().as_slice())?;
    Ok(apply_common_layers(router, cors))
}
