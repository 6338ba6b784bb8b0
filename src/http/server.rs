//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum service that feeds every request to the `Dispatcher`
//! - Wire up middleware (request ID, tracing, request deadline)
//! - Bind the server to a listener and stop on shutdown
//!
//! # Design Decisions
//! - A single fallback handler; all routing happens in the dispatcher
//! - A response the handler chain left open is held until the request
//!   deadline, which answers 408

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::http::request::{buffer_request, request_id_header, X_REQUEST_ID};
use crate::http::response::into_http_response;

/// State shared with the fallback handler.
#[derive(Clone)]
struct AppState {
    dispatcher: Arc<Dispatcher>,
    max_body_size: usize,
}

/// HTTP front end for a `Dispatcher`.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let state = AppState {
            dispatcher: Arc::clone(&dispatcher),
            max_body_size: config.limits.max_body_size,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            dispatcher,
        }
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(request_id_header(), MakeRequestUuid))
    }

    /// The configured axum service, for driving in-process.
    pub fn into_router(self) -> Router {
        self.router
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            env = %self.config.env,
            request_timeout_secs = self.config.timeouts.request_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Buffer the body, dispatch, and emit the result.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request = match buffer_request(request, state.max_body_size).await {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected request body");
            return e.into_response();
        }
    };

    let ctx = state.dispatcher.dispatch(request).await;
    if !ctx.is_finished() {
        tracing::warn!(
            path = %ctx.path(),
            state = ?ctx.chain_state(),
            "Response left open, holding until request deadline"
        );
        std::future::pending::<()>().await;
    }

    into_http_response(ctx.into_response())
}
