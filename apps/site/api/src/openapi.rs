//! OpenAPI documentation configuration

use utoipa::OpenApi;

use crate::api;

/// Combined OpenAPI documentation for the site API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "AI Consult API",
        version = "1.0.0",
        description = "Backend for the AI Consult website: contact form delivery and service status"
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(api::info::api_info, api::email::email_status),
    nest(
        (path = "/api/contact", api = domain_contact::ApiDoc)
    ),
    tags(
        (name = "Contact", description = "Website contact form"),
        (name = "Meta", description = "API and email service status")
    )
)]
pub struct ApiDoc;
