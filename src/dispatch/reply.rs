//! Handler return values.
//!
//! A handler that returns a non-empty reply ends the response with it as the
//! body. `Reply::Empty` (and an empty string) lets the chain carry on.

use serde::Serialize;
use serde_json::Value;

use crate::dispatch::handler::{HandlerError, HandlerResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Nothing to write; the handler either called `next` or ended the response itself.
    Empty,
    /// Written verbatim.
    Text(String),
    /// Serialized as JSON.
    Json(Value),
}

impl Reply {
    /// Body bytes and content type, or `None` when there is nothing to write.
    pub fn into_body(self) -> Option<(Vec<u8>, &'static str)> {
        match self {
            Reply::Empty => None,
            Reply::Text(text) if text.is_empty() => None,
            Reply::Text(text) => Some((text.into_bytes(), "text/plain; charset=utf-8")),
            Reply::Json(Value::Null) => None,
            Reply::Json(value) => Some((value.to_string().into_bytes(), "application/json")),
        }
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Empty
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_string())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Reply::Json(value)
    }
}

/// Finish the handler without a payload.
pub fn done() -> HandlerResult {
    Ok(Reply::Empty)
}

/// Finish the handler and end the response with `body`.
pub fn text(body: impl Into<String>) -> HandlerResult {
    Ok(Reply::Text(body.into()))
}

/// Finish the handler and end the response with `value` serialized as JSON.
pub fn json<T: Serialize>(value: T) -> HandlerResult {
    Ok(Reply::Json(serde_json::to_value(value)?))
}

/// Fail the handler. The dispatcher answers 500 unless the response already finished.
pub fn fail(error: impl Into<HandlerError>) -> HandlerResult {
    Err(error.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_replies_have_no_body() {
        assert!(Reply::Empty.into_body().is_none());
        assert!(Reply::from("").into_body().is_none());
        assert!(Reply::Json(Value::Null).into_body().is_none());
    }

    #[test]
    fn test_json_reply_serializes() {
        let reply = json(json!({"12": "aa"})).unwrap();
        let (body, content_type) = reply.into_body().unwrap();
        assert_eq!(body, br#"{"12":"aa"}"#);
        assert_eq!(content_type, "application/json");
    }
}
