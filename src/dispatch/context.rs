//! Per-request dispatch context.
//!
//! # Responsibilities
//! - Expose the request (method, path, headers, params, query, body)
//! - Buffer the response (status, headers, body) until it is finished
//! - Carry per-request session state and the application store
//!
//! # Design Decisions
//! - One context per dispatch, owned by the dispatcher and lent to handlers
//! - Once the response is finished further writes are ignored, never errors
//! - The application store is injected, there is no global registry

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::{Method, Request, StatusCode};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::dispatch::executor::ChainState;
use crate::dispatch::handler::HandlerError;
use crate::http::request::X_REQUEST_ID;
use crate::state::Store;

/// Buffered response written by handlers.
#[derive(Debug)]
pub struct ResponseState {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    finished: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            finished: false,
        }
    }
}

impl ResponseState {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Vec<u8>) {
        (self.status, self.headers, self.body)
    }
}

/// Everything a handler can see and change about one request.
pub struct Context {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    params: HashMap<String, String>,
    session: HashMap<String, Value>,
    store: Arc<Store>,
    response: ResponseState,
    state: ChainState,
}

impl Context {
    /// Build a context from a buffered request.
    pub fn from_request(request: Request<Bytes>, store: Arc<Store>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts
            .uri
            .query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query,
            headers: parts.headers,
            body,
            params: HashMap::new(),
            session: HashMap::new(),
            store,
            response: ResponseState::default(),
            state: ChainState::Idle,
        }
    }

    // ---- request -------------------------------------------------------

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// A request header as text, if present and valid UTF-8.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_request_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub(crate) fn bind_params(&mut self, params: Vec<(String, String)>) {
        self.params.extend(params);
    }

    /// Decoded query pairs in request order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Last value for a query key.
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Query string as a JSON object.
    ///
    /// Comma separated values become arrays. With `simple` unset, values that
    /// parse as numbers become JSON numbers.
    pub fn query_map(&self, simple: bool) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in &self.query {
            let parts: Vec<&str> = value.split(',').collect();
            let entry = if parts.len() > 1 {
                Value::Array(parts.into_iter().map(|p| Value::String(p.to_string())).collect())
            } else if simple {
                Value::String(value.clone())
            } else {
                parse_number(value).unwrap_or_else(|| Value::String(value.clone()))
            };
            map.insert(key.clone(), entry);
        }
        map
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn body_text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.body)
    }

    /// Raw `Cookie` request header.
    pub fn cookie(&self) -> Option<&str> {
        self.header(header::COOKIE)
    }

    /// Append a `Set-Cookie` header to the response.
    pub fn set_cookie(&mut self, name: &str, value: &str) -> Result<(), HandlerError> {
        let cookie = HeaderValue::try_from(format!("{}={};", name, value))?;
        self.response.headers.append(header::SET_COOKIE, cookie);
        Ok(())
    }

    // ---- state ---------------------------------------------------------

    /// Per-request session value. Session state starts empty every dispatch.
    pub fn session_state(&self, key: &str) -> Option<&Value> {
        self.session.get(key)
    }

    pub fn set_session_state(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.session.insert(key.into(), value.into());
    }

    /// Application-wide state shared by all requests.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn chain_state(&self) -> ChainState {
        self.state
    }

    pub(crate) fn set_chain_state(&mut self, state: ChainState) {
        self.state = state;
    }

    // ---- response ------------------------------------------------------

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        if !self.response.finished {
            self.response.status = status;
        }
    }

    pub fn response_header(&self, name: impl header::AsHeaderName) -> Option<&HeaderValue> {
        self.response.headers.get(name)
    }

    pub fn set_response_header(&mut self, name: HeaderName, value: HeaderValue) {
        if !self.response.finished {
            self.response.headers.insert(name, value);
        }
    }

    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    /// Append to the response body.
    pub fn send(&mut self, data: impl AsRef<[u8]>) {
        if self.response.finished {
            tracing::trace!(path = %self.path, "Write after response finished ignored");
            return;
        }
        self.response.body.extend_from_slice(data.as_ref());
    }

    /// Append a value serialized as JSON.
    pub fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), HandlerError> {
        let data = serde_json::to_vec(value)?;
        self.send(data);
        Ok(())
    }

    /// Finish the response. Later calls are no-ops.
    pub fn end(&mut self) {
        self.response.finished = true;
    }

    /// Append `data` and finish the response.
    pub fn end_with(&mut self, data: impl AsRef<[u8]>) {
        self.send(data);
        self.end();
    }

    pub fn is_finished(&self) -> bool {
        self.response.finished
    }

    /// End the response with a handler's returned payload.
    pub(crate) fn end_with_reply(&mut self, body: Vec<u8>, content_type: &'static str) {
        if self.response.finished {
            return;
        }
        if !self.response.headers.contains_key(header::CONTENT_TYPE) {
            self.response
                .headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        self.end_with(body);
    }

    /// Replace whatever was buffered with a plain-text status response.
    pub(crate) fn respond_plain(&mut self, status: StatusCode, body: &'static str) {
        if self.response.finished {
            return;
        }
        self.response.status = status;
        self.response.body.clear();
        self.response.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        self.end_with(body);
    }

    pub fn into_response(self) -> ResponseState {
        self.response
    }

    #[cfg(test)]
    pub(crate) fn for_test(method: &str, uri: &str) -> Self {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .expect("valid test request");
        Self::from_request(request, Arc::new(Store::new()))
    }
}

fn parse_number(value: &str) -> Option<Value> {
    if let Ok(int) = value.parse::<i64>() {
        return Some(Value::Number(int.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_parsing() {
        let ctx = Context::for_test("GET", "/search?q=rust+router&page=2&tags=a,b&page=3");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query_value("q"), Some("rust router"));
        assert_eq!(ctx.query_value("page"), Some("3"));

        let simple = ctx.query_map(true);
        assert_eq!(simple["page"], json!("3"));
        assert_eq!(simple["tags"], json!(["a", "b"]));

        let typed = ctx.query_map(false);
        assert_eq!(typed["page"], json!(3));
        assert_eq!(typed["q"], json!("rust router"));
    }

    #[test]
    fn test_writes_after_end_are_ignored() {
        let mut ctx = Context::for_test("GET", "/");
        ctx.send("hello ");
        ctx.end_with("world");
        ctx.send("!");
        ctx.set_status(StatusCode::IM_A_TEAPOT);
        ctx.end();

        assert!(ctx.is_finished());
        assert_eq!(ctx.response().body(), b"hello world");
        assert_eq!(ctx.status(), StatusCode::OK);
    }

    #[test]
    fn test_cookies() {
        let mut ctx = Context::for_test("GET", "/");
        assert_eq!(ctx.cookie(), None);
        ctx.set_request_header(header::COOKIE, HeaderValue::from_static("a=1"));
        assert_eq!(ctx.cookie(), Some("a=1"));

        ctx.set_cookie("session", "abc").unwrap();
        ctx.set_cookie("theme", "dark").unwrap();
        let cookies: Vec<_> = ctx.response().headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies[0], "session=abc;");
    }

    #[test]
    fn test_session_state() {
        let mut ctx = Context::for_test("GET", "/");
        assert!(ctx.session_state("user").is_none());
        ctx.set_session_state("user", "raj");
        assert_eq!(ctx.session_state("user"), Some(&json!("raj")));
    }

    #[test]
    fn test_respond_plain_replaces_partial_body() {
        let mut ctx = Context::for_test("GET", "/");
        ctx.send("partial");
        ctx.respond_plain(StatusCode::INTERNAL_SERVER_ERROR, "Handler execution failed");
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.response().body(), b"Handler execution failed");
    }
}
