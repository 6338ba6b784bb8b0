//! Request intake.
//!
//! # Responsibilities
//! - Name the request ID header shared by the tower-http layers and `Context`
//! - Buffer the streaming body into `Bytes` under the configured size limit
//!
//! # Design Decisions
//! - A declared `Content-Length` over the limit is refused before reading
//! - Handlers see a fully buffered body; there is no streaming body API

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Why a request body could not be buffered.
#[derive(Debug, Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Read(Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for BodyError {
    fn into_response(self) -> Response {
        match self {
            BodyError::TooLarge { .. } => {
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            }
            BodyError::Read(_) => {
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
            }
        }
    }
}

/// Read the whole body, refusing more than `limit` bytes.
pub async fn buffer_request(request: Request<Body>, limit: usize) -> Result<Request<Bytes>, BodyError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());
    if declared.is_some_and(|len| len > limit) {
        return Err(BodyError::TooLarge { limit });
    }

    let (parts, body) = request.into_parts();
    let collected = Limited::new(body, limit).collect().await.map_err(|e| {
        if e.is::<LengthLimitError>() {
            BodyError::TooLarge { limit }
        } else {
            BodyError::Read(e)
        }
    })?;

    Ok(Request::from_parts(parts, collected.to_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffers_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from("hello"))
            .unwrap();
        let buffered = buffer_request(request, 16).await.unwrap();
        assert_eq!(buffered.uri().path(), "/upload");
        assert_eq!(buffered.body().as_ref(), b"hello");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_LENGTH, "1024")
            .body(Body::from("x"))
            .unwrap();
        let err = buffer_request(request, 16).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { limit: 16 }));
        assert_eq!(err.into_response().status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_actual_length_over_limit() {
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();
        let err = buffer_request(request, 16).await.unwrap_err();
        assert!(matches!(err, BodyError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn test_stream_error_is_read_error() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"ok")),
            Err(std::io::Error::other("connection reset")),
        ];
        let request = Request::builder()
            .method("POST")
            .uri("/upload")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        let err = buffer_request(request, 16).await.unwrap_err();
        assert!(matches!(err, BodyError::Read(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
