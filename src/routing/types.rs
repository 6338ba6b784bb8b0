//! Routing types and error definitions.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;
use thiserror::Error;

/// Index of a route table inside a router.
///
/// `Middleware` is a pseudo-method: its table only ever holds the top-level
/// chain under the `/` key and is never matched against a request directly.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Middleware = 0,
    Get = 1,
    Post = 2,
    Put = 3,
    Patch = 4,
    Delete = 5,
    Options = 6,
}

impl HttpMethod {
    /// Number of route tables a router owns.
    pub const COUNT: usize = 7;

    /// Every table index, pseudo-method first.
    pub const ALL: [HttpMethod; Self::COUNT] = [
        HttpMethod::Middleware,
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
    ];

    /// Methods a request can actually arrive with.
    pub const REAL: [HttpMethod; 6] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Options,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Resolve an incoming request method. Matching is case-insensitive so
    /// that extension methods such as `get` still resolve.
    pub fn from_http(method: &Method) -> Option<Self> {
        Self::REAL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(method.as_str()))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Middleware => "MIDDLEWARE",
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RegistrationError;

    /// Parses a real HTTP method name. The middleware pseudo-method is not
    /// addressable by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::REAL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| RegistrationError::InvalidMethod(s.to_string()))
    }
}

/// Errors raised while building a route table.
///
/// These are programmer errors: startup code is expected to propagate them
/// and abort rather than continue with a partial table.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// A route or middleware was registered with no handlers.
    #[error("no handler provided for '{0}'")]
    EmptyHandlerChain(String),

    /// The method name does not map to a route table.
    #[error("invalid HTTP method '{0}'")]
    InvalidMethod(String),

    /// The router is already mounted at this prefix, or is being mounted into itself.
    #[error("router {router} is already mounted at '{prefix}'")]
    DuplicateRouterClass { router: uuid::Uuid, prefix: String },

    /// A regex-fallback pattern failed to compile.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
