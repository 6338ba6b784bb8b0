//! Switchyard: an HTTP request router and handler-chain dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum, request ID, deadline)
//!                         │
//!                         ▼
//!                     dispatch::Dispatcher
//!                         │  method check (501)
//!                         ▼
//!                     routing::Router ── static map ──┐
//!                         │                           │
//!                         └── segment-count bucket ───┤ (404 on miss)
//!                                                     ▼
//!                     dispatch::Next  [middleware.., route chain..]
//!                         │  error / panic (500)
//!                         ▼
//!     Client Response ◀── http::response
//! ```
//!
//! ```ignore
//! use switchyard::{handler, reply, Dispatcher, Router};
//!
//! let mut router = Router::new();
//! router.get("/about/:user_id", vec![handler(|ctx, _next| {
//!     Box::pin(async move {
//!         reply::text(format!("User: {}", ctx.param("user_id").unwrap_or_default()))
//!     })
//! })])?;
//! let dispatcher = Dispatcher::new(router);
//! ```

// Core subsystems
pub mod dispatch;
pub mod routing;
pub mod state;

// Transport and process
pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::ServerConfig;
pub use dispatch::{handler, object, reply, Context, Dispatcher, Handler, HandlerError, Next, Reply};
pub use http::{HttpServer, X_REQUEST_ID};
pub use lifecycle::Shutdown;
pub use routing::{HttpMethod, RegistrationError, Router};
pub use state::Store;
