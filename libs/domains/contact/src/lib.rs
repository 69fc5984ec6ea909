//! Contact Domain
//!
//! Accepts website contact-form submissions and hands them to the email
//! delivery service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← POST /api/contact, rate limited per client
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, logging
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ EmailService│  ← domain_notifications
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_contact::{ContactService, handlers};
//!
//! let service = ContactService::new(email_service);
//! let router = handlers::router(service, handlers::default_rate_limit());
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod service;

// Re-export commonly used types
pub use error::{ContactError, ContactResult};
pub use handlers::ApiDoc;
pub use models::{ContactRequest, ContactResponse};
pub use service::ContactService;
