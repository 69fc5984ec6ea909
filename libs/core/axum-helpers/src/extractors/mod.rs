//! Custom extractors for Axum handlers.

pub mod sanitized_json;

pub use sanitized_json::{Sanitize, SanitizedJson};
