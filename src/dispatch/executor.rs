//! Handler chain execution.
//!
//! # Responsibilities
//! - Resolve the route for a request and bind its parameters
//! - Run top-level middleware followed by the route chain, one handler at a time
//! - Synthesize 404 / 500 / 501 responses
//! - Allow registration after startup without blocking readers
//!
//! # Design Decisions
//! - The chain is a cursor over two borrowed slices; nothing is copied per request
//! - A handler continues the chain only by calling `Next::run`
//! - A non-empty reply ends the response; `run` on a finished response is a no-op
//! - Handler errors and panics become 500, not 404
//! - A chain that never finishes the response leaves it open; the transport's
//!   deadline is what eventually closes it
//! - The router sits behind an atomic pointer; writers clone, mutate and swap

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::body::Bytes;
use axum::http::{Request, StatusCode};
use futures_util::FutureExt;

use crate::dispatch::context::Context;
use crate::dispatch::handler::{BoxFuture, Handler, HandlerError};
use crate::observability::metrics;
use crate::routing::{HttpMethod, RegistrationError, Router};
use crate::state::Store;

/// Body of the response sent when no route matches.
pub const NOT_FOUND_BODY: &str = "Route not found";
/// Body of the response sent for methods without a route table.
pub const NOT_IMPLEMENTED_BODY: &str = "HTTP method not implemented";
/// Body of the response sent when a handler fails before finishing the response.
pub const HANDLER_FAILED_BODY: &str = "Handler execution failed";

/// Progress of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainState {
    /// No handler has run yet.
    Idle,
    /// The handler at this index was the last one entered. A dispatch that
    /// returns in this state left its response open.
    Running(usize),
    /// The response was finished by the chain.
    Completed,
    /// The dispatcher answered on its own (404, 501) or a handler failed.
    Aborted,
}

#[derive(Clone, Copy)]
struct Chain<'a> {
    middleware: &'a [Handler],
    route: &'a [Handler],
}

impl<'a> Chain<'a> {
    fn get(&self, index: usize) -> Option<&'a Handler> {
        match index.checked_sub(self.middleware.len()) {
            None => self.middleware.get(index),
            Some(i) => self.route.get(i),
        }
    }

    fn len(&self) -> usize {
        self.middleware.len() + self.route.len()
    }
}

/// Continuation handed to every handler.
pub struct Next<'a> {
    chain: Chain<'a>,
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn start(middleware: &'a [Handler], route: &'a [Handler]) -> Self {
        Self {
            chain: Chain { middleware, route },
            index: 0,
        }
    }

    /// A continuation with nothing after it.
    pub fn empty() -> Next<'static> {
        Next::start(&[], &[])
    }

    /// Handlers not yet entered.
    pub fn remaining(&self) -> usize {
        self.chain.len().saturating_sub(self.index)
    }

    /// Run the rest of the chain.
    ///
    /// Returns the first error raised downstream so that callers can
    /// propagate it with `?`.
    pub fn run<'c>(self, ctx: &'c mut Context) -> BoxFuture<'c, Result<(), HandlerError>>
    where
        'a: 'c,
    {
        Box::pin(async move {
            if ctx.is_finished() {
                tracing::trace!(index = self.index, "Response finished, next() ignored");
                return Ok(());
            }
            let Some(handler) = self.chain.get(self.index) else {
                return Ok(());
            };

            ctx.set_chain_state(ChainState::Running(self.index));
            let next = Next {
                chain: self.chain,
                index: self.index + 1,
            };

            let reply = handler.call(ctx, next).await?;
            if let Some((body, content_type)) = reply.into_body() {
                ctx.end_with_reply(body, content_type);
            }
            Ok(())
        })
    }
}

/// Routes requests through a router's tables.
pub struct Dispatcher {
    router: ArcSwap<Router>,
    writer: Mutex<()>,
    store: Arc<Store>,
}

impl Dispatcher {
    pub fn new(router: Router) -> Self {
        Self::with_store(router, Arc::new(Store::new()))
    }

    /// Create a dispatcher that hands `store` to every request.
    pub fn with_store(router: Router, store: Arc<Store>) -> Self {
        metrics::record_route_count(router.len());
        Self {
            router: ArcSwap::from_pointee(router),
            writer: Mutex::new(()),
            store,
        }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Snapshot of the current router.
    pub fn router(&self) -> Arc<Router> {
        self.router.load_full()
    }

    /// Change the route table while requests are in flight.
    ///
    /// The closure works on a copy; the copy replaces the live router only if
    /// the closure succeeds. Concurrent updates are serialized.
    pub fn update<F>(&self, f: F) -> Result<(), RegistrationError>
    where
        F: FnOnce(&mut Router) -> Result<(), RegistrationError>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let mut router = Router::clone(&self.router.load());
        f(&mut router)?;
        let routes = router.len();
        self.router.store(Arc::new(router));
        metrics::record_route_count(routes);
        tracing::info!(routes, "Route table updated");
        Ok(())
    }

    /// Dispatch one request and return its finished (or open) context.
    pub async fn dispatch(&self, request: Request<Bytes>) -> Context {
        let start = Instant::now();
        let router = self.router.load_full();
        let mut ctx = Context::from_request(request, Arc::clone(&self.store));

        tracing::debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            request_id = ctx.request_id().unwrap_or("-"),
            "Dispatching request"
        );

        execute(&router, &mut ctx).await;

        metrics::record_dispatch(ctx.method().as_str(), ctx.status().as_u16(), start);
        ctx
    }
}

async fn execute(router: &Router, ctx: &mut Context) {
    let Some(method) = HttpMethod::from_http(ctx.method()) else {
        tracing::error!(method = %ctx.method(), "HTTP method is not supported");
        ctx.respond_plain(StatusCode::NOT_IMPLEMENTED, NOT_IMPLEMENTED_BODY);
        ctx.set_chain_state(ChainState::Aborted);
        return;
    };

    let path = ctx.path().to_string();
    let Some(matched) = router.find(method, &path) else {
        tracing::warn!(method = %method, path = %path, "Route not found");
        ctx.respond_plain(StatusCode::NOT_FOUND, NOT_FOUND_BODY);
        ctx.set_chain_state(ChainState::Aborted);
        return;
    };

    ctx.bind_params(matched.params);
    let next = Next::start(router.middleware_chain(), matched.chain);

    match AssertUnwindSafe(next.run(ctx)).catch_unwind().await {
        Ok(Ok(())) => {
            if ctx.is_finished() {
                ctx.set_chain_state(ChainState::Completed);
            } else {
                tracing::debug!(path = %path, "Handler chain returned without finishing the response");
            }
        }
        Ok(Err(err)) => fail(ctx, &path, err),
        Err(panic) => fail(ctx, &path, HandlerError::Panicked(panic_message(panic))),
    }
}

fn fail(ctx: &mut Context, path: &str, err: HandlerError) {
    tracing::error!(path = %path, error = %err, "Handler execution failed");
    ctx.respond_plain(StatusCode::INTERNAL_SERVER_ERROR, HANDLER_FAILED_BODY);
    ctx.set_chain_state(ChainState::Aborted);
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::handler;
    use crate::dispatch::reply;

    fn request(method: &str, uri: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())
            .unwrap()
    }

    fn write_then_next(text: &'static str) -> Handler {
        handler(move |ctx, next| {
            Box::pin(async move {
                ctx.send(text);
                next.run(ctx).await?;
                reply::done()
            })
        })
    }

    fn returns(text: &'static str) -> Handler {
        handler(move |_ctx, _next| Box::pin(async move { reply::text(text) }))
    }

    fn body(ctx: &Context) -> &str {
        std::str::from_utf8(ctx.response().body()).unwrap()
    }

    #[tokio::test]
    async fn test_middleware_runs_before_route_chain() {
        let mut router = Router::new();
        router.middleware(vec![write_then_next("mw1,"), write_then_next("mw2,")]).unwrap();
        router.get("/chain", vec![write_then_next("h1,"), returns("h2")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/chain")).await;
        assert_eq!(body(&ctx), "mw1,mw2,h1,h2");
        assert_eq!(ctx.chain_state(), ChainState::Completed);
    }

    #[tokio::test]
    async fn test_returned_payload_halts_chain() {
        let mut router = Router::new();
        router.get("/halt", vec![returns("first"), returns("second")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/halt")).await;
        assert_eq!(body(&ctx), "first");
        assert_eq!(ctx.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_next_after_end_is_noop() {
        let mut router = Router::new();
        let ender = handler(|ctx, next| {
            Box::pin(async move {
                ctx.end_with("done");
                next.run(ctx).await?;
                reply::done()
            })
        });
        router.get("/end", vec![ender, returns("unreachable")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/end")).await;
        assert_eq!(body(&ctx), "done");
    }

    #[tokio::test]
    async fn test_open_response_stays_running() {
        let mut router = Router::new();
        router.get("/open", vec![write_then_next("a"), write_then_next("b")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/open")).await;
        assert!(!ctx.is_finished());
        assert_eq!(ctx.chain_state(), ChainState::Running(1));
    }

    #[tokio::test]
    async fn test_not_found_skips_middleware() {
        let mut router = Router::new();
        router.middleware(vec![returns("middleware")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/missing")).await;
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);
        assert_eq!(body(&ctx), NOT_FOUND_BODY);
        assert_eq!(ctx.chain_state(), ChainState::Aborted);
    }

    #[tokio::test]
    async fn test_unsupported_method_is_501() {
        let mut router = Router::new();
        router.all("/", vec![returns("root")]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("HEAD", "/")).await;
        assert_eq!(ctx.status(), StatusCode::NOT_IMPLEMENTED);
    }

    #[tokio::test]
    async fn test_handler_error_is_500() {
        let mut router = Router::new();
        let failing = handler(|_ctx, _next| {
            Box::pin(async move { reply::fail(HandlerError::msg("database unavailable")) })
        });
        router.get("/fail", vec![write_then_next("partial"), failing]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/fail")).await;
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(&ctx), HANDLER_FAILED_BODY);
    }

    #[tokio::test]
    async fn test_handler_panic_is_500() {
        let mut router = Router::new();
        let panicking = handler(|_ctx, _next| {
            Box::pin(async move {
                if true {
                    panic!("boom");
                }
                reply::done()
            })
        });
        router.get("/panic", vec![panicking]).unwrap();

        let ctx = Dispatcher::new(router).dispatch(request("GET", "/panic")).await;
        assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ctx.chain_state(), ChainState::Aborted);
    }

    #[tokio::test]
    async fn test_update_swaps_router() {
        let dispatcher = Dispatcher::new(Router::new());
        let ctx = dispatcher.dispatch(request("GET", "/late")).await;
        assert_eq!(ctx.status(), StatusCode::NOT_FOUND);

        dispatcher
            .update(|router| router.get("/late", vec![returns("registered")]).map(|_| ()))
            .unwrap();
        let ctx = dispatcher.dispatch(request("GET", "/late")).await;
        assert_eq!(body(&ctx), "registered");

        let failed = dispatcher.update(|router| router.get("/empty", vec![]).map(|_| ()));
        assert!(failed.is_err());
        assert!(dispatcher.router().find(HttpMethod::Get, "/empty").is_none());
    }

    #[test]
    fn test_next_remaining() {
        let handlers = vec![returns("a"), returns("b")];
        let next = Next::start(&handlers[..1], &handlers[1..]);
        assert_eq!(next.remaining(), 2);
        assert_eq!(Next::empty().remaining(), 0);
    }
}
