//! Route registration and lookup.
//!
//! # Responsibilities
//! - Register handler chains per method, for all methods, and as middleware
//! - Mount other routers, with or without a path prefix
//! - Resolve (method, path) to a handler chain plus bound parameters
//!
//! # Design Decisions
//! - One `RouteTable` per `HttpMethod`, indexed by the enum discriminant
//! - Top-level middleware lives in the `Middleware` table under the `/` key
//! - Mounting copies handler references into this router's own tables; the
//!   mounted router is never modified and never shares tables with the host
//! - Clones keep the router's identity, so a clone counts as the same router
//!   for duplicate-mount detection

use std::collections::HashSet;

use uuid::Uuid;

use crate::dispatch::handler::Handler;
use crate::routing::pattern::{join_paths, normalize_path, PatternKind, RoutePattern};
use crate::routing::table::{RouteMatch, RouteTable};
use crate::routing::types::{HttpMethod, RegistrationError};

/// Static key holding the top-level middleware chain.
const MIDDLEWARE_KEY: &str = "/";

/// A set of route tables plus the registration API that fills them.
#[derive(Clone)]
pub struct Router {
    id: Uuid,
    tables: [RouteTable; HttpMethod::COUNT],
    mounted: HashSet<(Uuid, String)>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            tables: Default::default(),
            mounted: HashSet::new(),
        }
    }

    /// Identity used to detect duplicate mounts.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn get(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Get, path, handlers)
    }

    pub fn post(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Post, path, handlers)
    }

    pub fn put(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Put, path, handlers)
    }

    pub fn patch(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Patch, path, handlers)
    }

    pub fn delete(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Delete, path, handlers)
    }

    pub fn options(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.register(HttpMethod::Options, path, handlers)
    }

    /// Register for a method given by name, e.g. from configuration.
    pub fn route(
        &mut self,
        method: &str,
        path: &str,
        handlers: Vec<Handler>,
    ) -> Result<&mut Self, RegistrationError> {
        let method: HttpMethod = method.parse()?;
        self.register(method, path, handlers)
    }

    /// Compile `path` and add `handlers` to the table for `method`.
    ///
    /// A static path that is already registered gets the handlers appended
    /// to its chain. Named and regex paths always add a new entry.
    pub fn register(
        &mut self,
        method: HttpMethod,
        path: &str,
        handlers: Vec<Handler>,
    ) -> Result<&mut Self, RegistrationError> {
        if handlers.is_empty() {
            return Err(RegistrationError::EmptyHandlerChain(path.to_string()));
        }
        let pattern = RoutePattern::compile(path)?;

        tracing::debug!(
            method = %method,
            path = %pattern.raw(),
            kind = ?pattern.kind(),
            handlers = handlers.len(),
            "Registered route"
        );

        self.tables[method.index()].insert(pattern, handlers);
        Ok(self)
    }

    /// Register the same chain for every real method.
    pub fn all(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        if handlers.is_empty() {
            return Err(RegistrationError::EmptyHandlerChain(path.to_string()));
        }
        for method in HttpMethod::REAL {
            self.register(method, path, handlers.clone())?;
        }
        Ok(self)
    }

    /// Append top-level middleware, run before every matched route.
    pub fn middleware(&mut self, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        if handlers.is_empty() {
            return Err(RegistrationError::EmptyHandlerChain(MIDDLEWARE_KEY.to_string()));
        }
        self.tables[HttpMethod::Middleware.index()]
            .insert(RoutePattern::compile(MIDDLEWARE_KEY)?, handlers);
        Ok(self)
    }

    /// Middleware scoped to one path. Equivalent to `all`.
    pub fn middleware_at(&mut self, path: &str, handlers: Vec<Handler>) -> Result<&mut Self, RegistrationError> {
        self.all(path, handlers)
    }

    /// Merge every table of `other` into this router, keys unchanged.
    ///
    /// Static chains under an existing key are appended, named entries are
    /// appended to their bucket, and `other`'s top-level middleware is
    /// appended to this router's.
    pub fn mount(&mut self, other: &Router) -> Result<&mut Self, RegistrationError> {
        self.check_mount(other, MIDDLEWARE_KEY)?;

        let mut staged = Vec::new();
        for method in HttpMethod::ALL {
            let source = other.table(method);
            for (key, chain) in source.static_routes() {
                staged.push((method, RoutePattern::compile(key)?, chain.to_vec()));
            }
            for route in source.named_routes() {
                staged.push((method, route.pattern.clone(), route.chain.clone()));
            }
        }
        self.commit_mount(other, MIDDLEWARE_KEY, staged);

        tracing::debug!(router = %other.id, routes = other.len(), "Mounted router");
        Ok(self)
    }

    /// Copy every route of `other` into this router under `prefix`.
    ///
    /// Named entries are recompiled from their joined path, so they land in
    /// the bucket for their new segment count. `other`'s top-level
    /// middleware becomes a path-scoped chain at `prefix`, ahead of any
    /// root route `other` has.
    ///
    /// Every joined pattern is compiled before anything is inserted, so a
    /// failed mount leaves this router unchanged.
    pub fn mount_at(&mut self, prefix: &str, other: &Router) -> Result<&mut Self, RegistrationError> {
        let prefix = normalize_path(prefix);
        if prefix == MIDDLEWARE_KEY {
            return self.mount(other);
        }
        self.check_mount(other, &prefix)?;

        let mut staged = Vec::new();
        let middleware = other.middleware_chain();
        if !middleware.is_empty() {
            let scope = RoutePattern::compile(&prefix)?;
            for method in HttpMethod::REAL {
                staged.push((method, scope.clone(), middleware.to_vec()));
            }
        }
        for method in HttpMethod::REAL {
            let source = other.table(method);
            for (key, chain) in source.static_routes() {
                let pattern = RoutePattern::compile(&join_paths(&prefix, key))?;
                staged.push((method, pattern, chain.to_vec()));
            }
            for route in source.named_routes() {
                let pattern = RoutePattern::compile(&join_paths(&prefix, &route.pattern.segment_path()))?;
                staged.push((method, pattern, route.chain.clone()));
            }
        }
        self.commit_mount(other, &prefix, staged);

        tracing::debug!(router = %other.id, prefix = %prefix, routes = other.len(), "Mounted router at prefix");
        Ok(self)
    }

    fn check_mount(&self, other: &Router, prefix: &str) -> Result<(), RegistrationError> {
        if other.id == self.id || self.mounted.contains(&(other.id, prefix.to_string())) {
            return Err(RegistrationError::DuplicateRouterClass {
                router: other.id,
                prefix: prefix.to_string(),
            });
        }
        Ok(())
    }

    fn commit_mount(&mut self, other: &Router, prefix: &str, staged: Vec<(HttpMethod, RoutePattern, Vec<Handler>)>) {
        for (method, pattern, chain) in staged {
            self.tables[method.index()].insert(pattern, chain);
        }
        self.mounted.insert((other.id, prefix.to_string()));
    }

    /// Look up the chain for a request without side effects.
    ///
    /// `Middleware` never matches; its chain is reached through
    /// `middleware_chain`.
    pub fn find(&self, method: HttpMethod, path: &str) -> Option<RouteMatch<'_>> {
        if method == HttpMethod::Middleware {
            return None;
        }
        self.tables[method.index()].lookup(path)
    }

    pub fn middleware_chain(&self) -> &[Handler] {
        self.tables[HttpMethod::Middleware.index()]
            .static_chain(MIDDLEWARE_KEY)
            .unwrap_or(&[])
    }

    pub fn table(&self, method: HttpMethod) -> &RouteTable {
        &self.tables[method.index()]
    }

    /// Total entries over all tables.
    pub fn len(&self) -> usize {
        self.tables.iter().map(RouteTable::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(RouteTable::is_empty)
    }

    /// Registered patterns for a method, static keys first. For diagnostics.
    pub fn patterns(&self, method: HttpMethod) -> Vec<(String, PatternKind)> {
        let table = self.table(method);
        let mut statics: Vec<_> = table
            .static_routes()
            .map(|(key, _)| (key.to_string(), PatternKind::Static))
            .collect();
        statics.sort_by(|a, b| a.0.cmp(&b.0));
        statics.extend(
            table
                .named_routes()
                .map(|route| (route.pattern.raw().to_string(), route.pattern.kind())),
        );
        statics
    }
}
