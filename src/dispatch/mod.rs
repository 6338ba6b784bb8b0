//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request<Bytes>
//!     → context.rs (Context: request view + response buffer)
//!     → executor.rs (Dispatcher: method check, route lookup, bind params)
//!     → Next::run over [top-level middleware.., route chain..]
//!         → handler.rs (Handler::call)
//!         → reply.rs (non-empty Reply ends the response)
//!     → Context returned to the transport (finished or open)
//! ```
//!
//! # Design Decisions
//! - Strictly sequential within a request; a handler continues only via `next`
//! - Failures are contained at the dispatch boundary and never crash the process

pub mod context;
pub mod executor;
pub mod handler;
pub mod reply;

pub use context::{Context, ResponseState};
pub use executor::{ChainState, Dispatcher, Next};
pub use handler::{handler, object, BoxFuture, Handler, HandlerError, HandlerResult, HandlerSource, RequestHandler};
pub use reply::Reply;
