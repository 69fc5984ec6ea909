//! JSON extractor that scrubs user-supplied text before the handler sees it.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// Request payloads that can strip markup from their free-text fields.
///
/// Implementations usually call [`crate::http::sanitize_text`] on each
/// string field a person typed.
pub trait Sanitize {
    fn sanitize(&mut self);
}

impl<T: Sanitize> Sanitize for Option<T> {
    fn sanitize(&mut self) {
        if let Some(inner) = self {
            inner.sanitize();
        }
    }
}

impl Sanitize for String {
    fn sanitize(&mut self) {
        *self = crate::http::sanitize_text(self);
    }
}

/// JSON extractor that applies [`Sanitize`] after deserializing.
///
/// Validation is left to the handler so each route can shape its own
/// validation response. Malformed bodies are rejected with the standard
/// [`AppError`] envelope.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::{Sanitize, SanitizedJson};
///
/// #[derive(Deserialize)]
/// struct Feedback {
///     comment: String,
/// }
///
/// impl Sanitize for Feedback {
///     fn sanitize(&mut self) {
///         self.comment.sanitize();
///     }
/// }
///
/// async fn submit(SanitizedJson(payload): SanitizedJson<Feedback>) -> String {
///     payload.comment
/// }
/// ```
pub struct SanitizedJson<T>(pub T);

impl<T, S> FromRequest<S> for SanitizedJson<T>
where
    T: DeserializeOwned + Sanitize,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut data) = Json::<T>::from_request(req, state).await?;
        data.sanitize();
        Ok(SanitizedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Note {
        title: String,
        body: Option<String>,
    }

    impl Sanitize for Note {
        fn sanitize(&mut self) {
            self.title.sanitize();
            self.body.sanitize();
        }
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_fields_are_sanitized() {
        let request = json_request(
            r#"{"title":"  Hi<script>alert(1)</script> ","body":"<a href=\"javascript:x\">y</a>"}"#,
        );

        let SanitizedJson(note) = SanitizedJson::<Note>::from_request(request, &()).await.unwrap();

        assert_eq!(note.title, "Hi");
        assert_eq!(note.body.as_deref(), Some("<a href=\"x\">y</a>"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let rejection = SanitizedJson::<Note>::from_request(json_request("{not json"), &())
            .await
            .err()
            .unwrap();

        assert_eq!(rejection.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
