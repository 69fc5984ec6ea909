//! HTTP middleware module.
//!
//! This module provides HTTP-level middleware for:
//! - CORS configuration
//! - Security headers
//! - Per-client rate limiting
//! - Free-text sanitization
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{create_cors_layer, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&origins)?);
//! ```

pub mod client_ip;
pub mod cors;
pub mod rate_limit;
pub mod sanitize;
pub mod security;

// Re-export commonly used functions
pub use client_ip::{client_ip, extract_ip_from_headers};
pub use cors::create_cors_layer;
pub use rate_limit::{DEFAULT_TRUSTED_PROXY_HOPS, RateLimit, rate_limit};
pub use sanitize::sanitize_text;
pub use security::security_headers;
