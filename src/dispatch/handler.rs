//! Handler contract.
//!
//! # Responsibilities
//! - Define the function shape every middleware and route handler has
//! - Normalize plain functions and handler objects into one representation
//! - Define the error a handler can fail with
//!
//! # Design Decisions
//! - Handlers borrow the request context mutably and receive the `Next`
//!   continuation by value; calling it is how a handler continues the chain
//! - Object handlers are wrapped at registration time, so dispatch never
//!   inspects what kind of handler it is calling

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::context::Context;
use crate::dispatch::executor::Next;
use crate::dispatch::reply::Reply;

/// Boxed future returned by handlers.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a handler resolves to.
pub type HandlerResult = Result<Reply, HandlerError>;

type HandlerFn = dyn for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult>
    + Send
    + Sync;

/// Errors raised by handler code during dispatch.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Failure described by the handler itself.
    #[error("{0}")]
    Message(String),

    /// A reply could not be serialized.
    #[error("failed to serialize reply: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    /// The handler panicked; the payload is captured when it is a string.
    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl HandlerError {
    pub fn msg(message: impl Into<String>) -> Self {
        HandlerError::Message(message.into())
    }
}

/// A handler written as a type with a `handle` method.
pub trait RequestHandler: Send + Sync + 'static {
    fn handle<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult>;
}

/// Where a handler came from, before normalization.
pub enum HandlerSource {
    Function(Arc<HandlerFn>),
    Object(Arc<dyn RequestHandler>),
}

impl HandlerSource {
    /// Collapse either variant into a callable `Handler`.
    pub fn normalize(self) -> Handler {
        match self {
            HandlerSource::Function(f) => Handler { inner: f },
            HandlerSource::Object(object) => handler(move |ctx, next| {
                let object = Arc::clone(&object);
                Box::pin(async move { object.handle(ctx, next).await })
            }),
        }
    }
}

/// A normalized handler, cheap to clone into several route tables.
#[derive(Clone)]
pub struct Handler {
    inner: Arc<HandlerFn>,
}

impl Handler {
    pub(crate) fn call<'a>(&'a self, ctx: &'a mut Context, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        (self.inner)(ctx, next)
    }

    /// True when both values wrap the same function.
    pub fn ptr_eq(&self, other: &Handler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

impl From<HandlerSource> for Handler {
    fn from(source: HandlerSource) -> Self {
        source.normalize()
    }
}

/// Build a handler from a function or closure.
///
/// ```ignore
/// let hello = handler(|_ctx, _next| Box::pin(async move { reply::text("hello") }));
/// ```
pub fn handler<F>(f: F) -> Handler
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    HandlerSource::Function(Arc::new(f)).normalize()
}

/// Build a handler from a `RequestHandler` implementation.
pub fn object<H: RequestHandler>(object: H) -> Handler {
    HandlerSource::Object(Arc::new(object)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::reply;

    struct Greeter {
        greeting: &'static str,
    }

    impl RequestHandler for Greeter {
        fn handle<'a>(&'a self, ctx: &'a mut Context, _next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                let name = ctx.param("name").unwrap_or("stranger").to_string();
                reply::text(format!("{}, {}", self.greeting, name))
            })
        }
    }

    #[test]
    fn test_clones_share_function() {
        let a = handler(|_ctx, _next| Box::pin(async move { reply::done() }));
        let b = a.clone();
        let c = handler(|_ctx, _next| Box::pin(async move { reply::done() }));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[tokio::test]
    async fn test_object_handler_is_normalized() {
        let greeter = object(Greeter { greeting: "Hello" });
        let mut ctx = Context::for_test("GET", "/greet/raj");
        ctx.bind_params(vec![("name".into(), "raj".into())]);

        let reply = greeter.call(&mut ctx, Next::empty()).await.unwrap();
        assert_eq!(reply, Reply::Text("Hello, raj".into()));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(HandlerError::msg("boom").to_string(), "boom");
        assert_eq!(
            HandlerError::Panicked("oops".into()).to_string(),
            "handler panicked: oops"
        );
    }
}
