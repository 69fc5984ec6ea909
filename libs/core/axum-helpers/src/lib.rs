//! # Axum Helpers
//!
//! Utilities, middleware, and helpers shared by the site's Axum services.
//!
//! ## Modules
//!
//! - **[`server`]**: Router assembly, health checks, graceful shutdown
//! - **[`http`]**: HTTP middleware (CORS, security headers, rate limiting, sanitization)
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: Custom extractors (sanitized JSON)
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum::Router;
//! use axum_helpers::server::{apply_common_layers, create_app, create_router};
//! use axum_helpers::http::create_cors_layer;
//! use core_config::server::ServerConfig;
//! use utoipa::OpenApi;
//!
//! #[derive(OpenApi)]
//! #[openapi(paths())]
//! struct ApiDoc;
//!
//! #[tokio::main]
//! async fn main() -> eyre::Result<()> {
//!     let api_routes = Router::new(); // Add your routes
//!     let router = create_router::<ApiDoc>(api_routes);
//!     let app = apply_common_layers(router, create_cors_layer(&["http://localhost:3000"])?);
//!
//!     create_app(app, &ServerConfig::default()).await?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

// Re-export server types
pub use server::{
    ComponentStatus, HealthResponse, ReadyResponse, apply_common_layers, create_app,
    create_router, health_router, shutdown_signal,
};

// Re-export HTTP middleware
pub use http::{
    RateLimit, client_ip, create_cors_layer, extract_ip_from_headers, rate_limit, sanitize_text,
    security_headers,
};

// Re-export error types
pub use errors::{AppError, ErrorCode, ErrorResponse};

// Re-export extractors
pub use extractors::{Sanitize, SanitizedJson};
