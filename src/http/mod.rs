//! HTTP adapter subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, trace span, deadline)
//!     → request.rs (buffer body under the size limit)
//!     → Dispatcher::dispatch (routing + handler chain)
//!     → response.rs (ResponseState → HTTP response)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{BodyError, X_REQUEST_ID};
pub use server::HttpServer;
