use super::shutdown::shutdown_signal;
use crate::errors::handlers::not_found;
use crate::http::security::security_headers;
use axum::{Router, extract::DefaultBodyLimit, middleware};
use core_config::server::ServerConfig;
use std::io;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable as ScalarServable};

/// Largest request body accepted by [`apply_common_layers`].
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Starts the Axum server with graceful shutdown.
///
/// The peer address of each connection is recorded as
/// `ConnectInfo<SocketAddr>` so rate limiting can fall back to it.
///
/// # Errors
/// Returns an error if:
/// - The TCP listener fails to bind to the configured address
/// - The server encounters an error during operation
///
/// # Example
/// ```ignore
/// let config = ServerConfig::default();
/// create_app(router, &config).await?;
/// ```
pub async fn create_app(router: Router, server_config: &ServerConfig) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;

    info!("Server starting on {}", listener.local_addr()?);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .inspect_err(|e| {
        tracing::error!("Server encountered an error: {:?}", e);
    })?;

    info!("Server stopped");
    Ok(())
}

/// Mounts API routes under `/api` next to the Scalar reference UI.
///
/// Unknown `/api/*` paths answer with the JSON 404 envelope. Everything
/// outside `/api` is left to the caller's fallback.
///
/// # Type Parameters
/// * `T` - A type implementing `utoipa::OpenApi` for API documentation
///
/// # Example
/// ```ignore
/// #[derive(OpenApi)]
/// #[openapi(paths(/* your paths */))]
/// struct ApiDoc;
///
/// let api_routes = Router::new()
///     .route("/example", get(handler))
///     .with_state(my_state);
///
/// let router = create_router::<ApiDoc>(api_routes);
/// ```
pub fn create_router<T>(apis: Router) -> Router
where
    T: OpenApi + 'static,
{
    Router::new()
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest("/api", apis.fallback(not_found))
}

/// Cross-cutting middleware shared by every route, fallback included.
///
/// Call this last, after all routes and the fallback are in place:
/// - request tracing
/// - security headers
/// - CORS
/// - 1 MiB body limit
/// - response compression (gzip, br, deflate, zstd)
pub fn apply_common_layers(router: Router, cors: CorsLayer) -> Router {
    router
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::create_cors_layer;
    use axum::{body::Body, extract::Request, http::StatusCode, routing::get};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[derive(OpenApi)]
    #[openapi(info(title = "test"))]
    struct TestDoc;

    fn app() -> Router {
        let apis = Router::new().route("/ping", get(|| async { "pong" }));
        let router = create_router::<TestDoc>(apis).fallback(|| async { "spa" });
        apply_common_layers(router, create_cors_layer(&["http://localhost:3000"]).unwrap())
    }

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_api_routes_are_nested() {
        assert_eq!(get_body("/api/ping").await, (StatusCode::OK, "pong".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_api_path_is_json_404() {
        let (status, body) = get_body("/api/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["message"], "Route /api/missing not found");
    }

    #[tokio::test]
    async fn test_other_paths_reach_fallback() {
        assert_eq!(get_body("/about").await, (StatusCode::OK, "spa".to_string()));
    }

    #[tokio::test]
    async fn test_scalar_is_served() {
        let (status, _) = get_body("/scalar").await;
        assert_eq!(status, StatusCode::OK);
    }
}
