//! Per-method route table.
//!
//! # Responsibilities
//! - Hold static routes keyed by normalized path
//! - Hold named/regex routes partitioned by segment count
//! - Resolve a request path to a handler chain and its parameters
//!
//! # Design Decisions
//! - Registering an existing static path appends to its chain, never replaces
//! - Static lookup always precedes named lookup
//! - Within a partition the first structural match wins, in registration order

use std::collections::HashMap;

use crate::dispatch::handler::Handler;
use crate::routing::pattern::{split_segments, trim_request_path, PatternKind, RoutePattern};

/// A named or regex route and its chain.
#[derive(Clone)]
pub struct NamedRoute {
    pub pattern: RoutePattern,
    pub chain: Vec<Handler>,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// Handlers registered for the matched route.
    pub chain: &'a [Handler],
    /// Bound path parameters in pattern order.
    pub params: Vec<(String, String)>,
}

/// Route index for a single HTTP method.
#[derive(Clone, Default)]
pub struct RouteTable {
    static_routes: HashMap<String, Vec<Handler>>,
    named_partitions: HashMap<usize, Vec<NamedRoute>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a compiled pattern, appending to an existing static chain.
    pub fn insert(&mut self, pattern: RoutePattern, handlers: Vec<Handler>) {
        match pattern.kind() {
            PatternKind::Static => {
                self.static_routes
                    .entry(pattern.raw().to_string())
                    .or_default()
                    .extend(handlers);
            }
            PatternKind::NamedFast | PatternKind::NamedRegex => {
                self.named_partitions
                    .entry(pattern.segment_count())
                    .or_default()
                    .push(NamedRoute {
                        pattern,
                        chain: handlers,
                    });
            }
        }
    }

    /// Chain registered under an exact static key.
    pub fn static_chain(&self, path: &str) -> Option<&[Handler]> {
        self.static_routes.get(path).map(Vec::as_slice)
    }

    /// Named routes sharing a segment count, in registration order.
    pub fn partition(&self, segment_count: usize) -> Option<&[NamedRoute]> {
        self.named_partitions.get(&segment_count).map(Vec::as_slice)
    }

    pub fn static_routes(&self) -> impl Iterator<Item = (&str, &[Handler])> {
        self.static_routes
            .iter()
            .map(|(path, chain)| (path.as_str(), chain.as_slice()))
    }

    /// All named routes. Buckets are visited in ascending segment count so
    /// that copies made from this iterator are deterministic.
    pub fn named_routes(&self) -> impl Iterator<Item = &NamedRoute> {
        let mut buckets: Vec<_> = self.named_partitions.iter().collect();
        buckets.sort_by_key(|(count, _)| **count);
        buckets.into_iter().flat_map(|(_, routes)| routes.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.static_routes.is_empty() && self.named_partitions.is_empty()
    }

    /// Number of static keys plus named entries.
    pub fn len(&self) -> usize {
        self.static_routes.len() + self.named_partitions.values().map(Vec::len).sum::<usize>()
    }

    /// Resolve a request path (query string already removed).
    pub fn lookup(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = trim_request_path(path);

        if let Some(chain) = self.static_chain(path) {
            return Some(RouteMatch {
                chain,
                params: Vec::new(),
            });
        }

        let segments = split_segments(path);
        let bucket = self.partition(segments.len())?;

        bucket.iter().find_map(|route| {
            route.pattern.matches(path, &segments).map(|params| RouteMatch {
                chain: route.chain.as_slice(),
                params,
            })
        })
    }
}
