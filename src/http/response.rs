//! Response emission.
//!
//! Turns the buffered `ResponseState` of a finished dispatch into an axum
//! response. Status, headers (including repeated `Set-Cookie`) and body are
//! passed through unchanged.

use axum::body::Body;
use axum::response::Response;

use crate::dispatch::context::ResponseState;

pub fn into_http_response(state: ResponseState) -> Response {
    let (status, headers, body) = state.into_parts();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::context::Context;
    use axum::http::{header, StatusCode};

    #[tokio::test]
    async fn test_state_becomes_response() {
        let mut ctx = Context::for_test("GET", "/");
        ctx.set_status(StatusCode::CREATED);
        ctx.set_cookie("a", "1").unwrap();
        ctx.set_cookie("b", "2").unwrap();
        ctx.end_with("made");

        let response = into_http_response(ctx.into_response());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"made");
    }
}
