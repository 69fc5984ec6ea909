//! Server infrastructure module.
//!
//! This module provides:
//! - Router assembly with OpenAPI documentation
//! - Common middleware stack
//! - Health and readiness endpoints
//! - Graceful shutdown
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::server::{apply_common_layers, create_app, create_router, health_router};
//! use core_config::{server::ServerConfig, app_info};
//!
//! let router = create_router::<ApiDoc>(api_routes)
//!     .merge(health_router(app_info!(), components))
//!     .fallback_service(static_files);
//! let app = apply_common_layers(router, cors);
//!
//! create_app(app, &ServerConfig::default()).await?;
//! ```

pub mod app;
pub mod health;
pub mod shutdown;

pub use app::{BODY_LIMIT_BYTES, apply_common_layers, create_app, create_router};
pub use health::{ComponentStatus, HealthResponse, ReadyResponse, health_router};
pub use shutdown::shutdown_signal;
