//! Route and filter storage and lookup.
//!
//! # Responsibilities
//! - Store route entries (method, pattern, produced type, handler)
//! - Store before and after filter entries
//! - Select the best route for a request
//! - List every filter of a phase that applies to a request
//!
//! # Design Decisions
//! - Append-only; entries are never removed or reordered
//! - Frozen behind an `Arc` once traffic starts, so lookups need no locks
//! - Route selection: method and path first, then the best `Accept` fitness;
//!   ties go to the earliest registration
//! - Filters run in registration order; their produced type only has to be
//!   acceptable, not the best fit
//! - O(n) scan over entries (acceptable for typical route counts)

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::Interrupt;
use crate::http::{Body, Request, Response};
use crate::routing::accept::{AcceptHeader, Fitness};
use crate::routing::pattern::{PathMatch, PathPattern};

/// Route handler: reads the request, may mutate the response, returns a body.
pub type RouteHandler = Arc<dyn Fn(&Request, &mut Response) -> Result<Body, Interrupt> + Send + Sync>;

/// Filter handler: runs around the route for cross-cutting concerns.
pub type FilterHandler = Arc<dyn Fn(&Request, &mut Response) -> Result<(), Interrupt> + Send + Sync>;

/// When a filter runs relative to the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterPhase {
    Before,
    After,
}

/// A registered route.
#[derive(Clone)]
pub struct RouteEntry {
    /// `None` matches every method.
    method: Option<Method>,
    pattern: PathPattern,
    accept_type: String,
    handler: RouteHandler,
}

impl RouteEntry {
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn accept_type(&self) -> &str {
        &self.accept_type
    }

    pub fn handler(&self) -> &RouteHandler {
        &self.handler
    }

    fn allows(&self, method: &Method) -> bool {
        self.method.as_ref().map_or(true, |m| m == method)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("pattern", &self.pattern.template())
            .field("accept_type", &self.accept_type)
            .finish()
    }
}

/// A registered filter.
#[derive(Clone)]
pub struct FilterEntry {
    phase: FilterPhase,
    pattern: PathPattern,
    accept_type: String,
    handler: FilterHandler,
}

impl FilterEntry {
    pub fn phase(&self) -> FilterPhase {
        self.phase
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn accept_type(&self) -> &str {
        &self.accept_type
    }

    pub fn handler(&self) -> &FilterHandler {
        &self.handler
    }
}

impl fmt::Debug for FilterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterEntry")
            .field("phase", &self.phase)
            .field("pattern", &self.pattern.template())
            .field("accept_type", &self.accept_type)
            .finish()
    }
}

/// A route selected for a request, with its captures.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    pub captures: PathMatch,
}

/// A filter that applies to a request, with its captures.
#[derive(Debug)]
pub struct FilterMatch<'a> {
    pub entry: &'a FilterEntry,
    pub captures: PathMatch,
}

/// Ordered store of routes and filters.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    routes: Vec<RouteEntry>,
    before: Vec<FilterEntry>,
    after: Vec<FilterEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_route(
        &mut self,
        method: Option<Method>,
        pattern: PathPattern,
        accept_type: impl Into<String>,
        handler: RouteHandler,
    ) {
        let entry = RouteEntry {
            method,
            pattern,
            accept_type: accept_type.into(),
            handler,
        };
        tracing::debug!(
            method = ?entry.method,
            pattern = %entry.pattern,
            accept_type = %entry.accept_type,
            "Route registered"
        );
        self.routes.push(entry);
    }

    pub fn add_filter(
        &mut self,
        phase: FilterPhase,
        pattern: PathPattern,
        accept_type: impl Into<String>,
        handler: FilterHandler,
    ) {
        let entry = FilterEntry {
            phase,
            pattern,
            accept_type: accept_type.into(),
            handler,
        };
        tracing::debug!(
            phase = ?entry.phase,
            pattern = %entry.pattern,
            accept_type = %entry.accept_type,
            "Filter registered"
        );
        match phase {
            FilterPhase::Before => self.before.push(entry),
            FilterPhase::After => self.after.push(entry),
        }
    }

    /// Best route for `method` and `path` given the request's `Accept` header.
    pub fn find_route(&self, method: &Method, path: &str, accept: &AcceptHeader) -> Option<RouteMatch<'_>> {
        let mut best: Option<(Fitness, RouteMatch<'_>)> = None;

        for entry in self.routes.iter().filter(|e| e.allows(method)) {
            let Some(captures) = entry.pattern.matches(path) else {
                continue;
            };
            let Some(fitness) = accept.fitness(&entry.accept_type) else {
                continue;
            };
            // Strictly better only, so the earliest registration wins ties.
            if best.as_ref().map_or(true, |(b, _)| fitness > *b) {
                best = Some((fitness, RouteMatch { entry, captures }));
            }
        }

        best.map(|(_, m)| m)
    }

    /// Every filter of `phase` matching `path` whose produced type is acceptable.
    pub fn find_filters(&self, phase: FilterPhase, path: &str, accept: &AcceptHeader) -> Vec<FilterMatch<'_>> {
        let entries = match phase {
            FilterPhase::Before => &self.before,
            FilterPhase::After => &self.after,
        };

        entries
            .iter()
            .filter(|entry| accept.accepts(&entry.accept_type))
            .filter_map(|entry| {
                entry
                    .pattern
                    .matches(path)
                    .map(|captures| FilterMatch { entry, captures })
            })
            .collect()
    }

    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    pub fn filters(&self, phase: FilterPhase) -> &[FilterEntry] {
        match phase {
            FilterPhase::Before => &self.before,
            FilterPhase::After => &self.after,
        }
    }
}
