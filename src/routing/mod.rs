//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (startup, or Dispatcher::update):
//!     path + handlers
//!     → pattern.rs (normalize, classify, compile regex key)
//!     → table.rs (static map | segment-count partition)
//!     → router.rs (one table per method, middleware under "/")
//!
//! Lookup (per request):
//!     method + path
//!     → router.rs (select table)
//!     → table.rs (static hit? else partition by segment count)
//!     → pattern.rs (positional compare | regex captures)
//!     → RouteMatch { chain, params } or None
//! ```
//!
//! # Design Decisions
//! - Static routes win over named routes for the same path
//! - Named routes are only compared against paths with their segment count
//! - First match wins inside a partition (registration order)
//! - Lookup never fails with an error; a miss is `None`

pub mod pattern;
pub mod router;
pub mod table;
pub mod types;

pub use pattern::{PatternKind, RoutePattern, Segment};
pub use router::Router;
pub use table::{NamedRoute, RouteMatch, RouteTable};
pub use types::{HttpMethod, RegistrationError};
