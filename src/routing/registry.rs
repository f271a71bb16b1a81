//! Route registry.
//!
//! # Responsibilities
//! - Own every registered route, in registration order
//! - Keep one trie per HTTP method and resolve lookups against it
//! - Distinguish "wrong method" from "no such path"
//!
//! # Design Decisions
//! - `RouteMethod::Any` is stored once and inserted into every method's trie
//! - Routes replaced under the override policy stay in the ordered list, so
//!   diagnostics show what was declared
//! - Allowed methods come back in a fixed canonical order

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::Method;
use serde::{Serialize, Serializer};

use crate::config::schema::DuplicatePolicy;
use crate::pipeline::Pipeline;

use super::bindings::Bindings;
use super::error::RouteError;
use super::media::MediaType;
use super::pattern::{split_path, RoutePattern};
use super::tree::Node;

/// Concrete methods a `*` route is registered under, in canonical order.
pub const METHODS: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
    Method::OPTIONS,
    Method::CONNECT,
    Method::TRACE,
];

fn method_rank(method: &Method) -> usize {
    METHODS
        .iter()
        .position(|m| m == method)
        .unwrap_or(METHODS.len())
}

/// Sort methods canonically; extension methods follow alphabetically.
pub fn sort_methods(methods: &mut [Method]) {
    methods.sort_by(|a, b| {
        method_rank(a)
            .cmp(&method_rank(b))
            .then_with(|| a.as_str().cmp(b.as_str()))
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteId(pub usize);

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Method a route is declared for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Any,
    Method(Method),
}

impl RouteMethod {
    /// Parse `*` or a method token.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "*" {
            return Some(RouteMethod::Any);
        }
        Method::from_bytes(raw.to_ascii_uppercase().as_bytes())
            .ok()
            .map(RouteMethod::Method)
    }

    /// Concrete methods whose tries receive this route.
    pub fn expand(&self) -> Vec<Method> {
        match self {
            RouteMethod::Any => METHODS.to_vec(),
            RouteMethod::Method(method) => vec![method.clone()],
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RouteMethod::Any => "*",
            RouteMethod::Method(method) => method.as_str(),
        }
    }
}

impl From<Method> for RouteMethod {
    fn from(method: Method) -> Self {
        RouteMethod::Method(method)
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for RouteMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A compiled route. Immutable once registered.
pub struct Route {
    pub(crate) id: RouteId,
    pub(crate) method: RouteMethod,
    pub(crate) pattern: RoutePattern,
    pub(crate) source: String,
    pub(crate) name: Option<String>,
    pub(crate) produces: Vec<MediaType>,
    pub(crate) consumes: Vec<MediaType>,
    pub(crate) detached: bool,
    pub(crate) pipeline: Pipeline,
}

impl Route {
    pub fn id(&self) -> RouteId {
        self.id
    }

    pub fn method(&self) -> &RouteMethod {
        &self.method
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Full pattern text as declared, scope prefixes included.
    pub fn path(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            id: self.id,
            method: self.method.clone(),
            pattern: self.source.clone(),
            name: self.name.clone(),
        }
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("pattern", &self.source)
            .field("name", &self.name)
            .field("detached", &self.detached)
            .finish_non_exhaustive()
    }
}

/// Diagnostic view of one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSummary {
    pub id: RouteId,
    pub method: RouteMethod,
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Result of resolving (method, path).
#[derive(Debug, Clone)]
pub enum Match {
    Found { route: Arc<Route>, bindings: Bindings },
    MethodNotAllowed { allowed: Vec<Method> },
    NotFound,
}

impl Match {
    pub fn is_found(&self) -> bool {
        matches!(self, Match::Found { .. })
    }

    pub fn method_mismatch(&self) -> bool {
        matches!(self, Match::MethodNotAllowed { .. })
    }
}

pub struct RouteRegistry {
    routes: Vec<Arc<Route>>,
    trees: HashMap<Method, Node<Arc<Route>>>,
    policy: DuplicatePolicy,
}

impl RouteRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            routes: Vec::new(),
            trees: HashMap::new(),
            policy,
        }
    }

    pub fn insert(&mut self, route: Route) -> Result<Arc<Route>, RouteError> {
        let route = Arc::new(route);
        let methods = route.method.expand();
        let segments = route.pattern.segments();

        if self.policy == DuplicatePolicy::Reject {
            let taken = methods.iter().any(|method| {
                self.trees
                    .get(method)
                    .and_then(|tree| tree.get_exact(segments))
                    .is_some()
            });
            if taken {
                return Err(RouteError::Duplicate {
                    method: route.method.clone(),
                    pattern: route.source.clone(),
                });
            }
        }

        for method in methods {
            let tree = self.trees.entry(method.clone()).or_default();
            let replaced = tree.insert(segments, route.clone()).map_err(|conflict| {
                RouteError::ConflictingConstraint {
                    method: route.method.clone(),
                    pattern: route.source.clone(),
                    existing: conflict.existing,
                    incoming: conflict.incoming,
                }
            })?;

            if let Some(previous) = replaced {
                tracing::warn!(
                    method = %method,
                    pattern = %route.source,
                    replaced = %previous.id,
                    "Route overrides an earlier registration"
                );
            }
        }

        tracing::debug!(
            id = %route.id,
            method = %route.method,
            pattern = %route.source,
            "Route registered"
        );
        self.routes.push(route.clone());
        Ok(route)
    }

    pub fn find(&self, method: &Method, path: &str) -> Match {
        let segments = split_path(path);

        if let Some((route, values)) = self.trees.get(method).and_then(|tree| tree.find(&segments)) {
            let bindings = Bindings::zip(route.pattern.variables(), values);
            return Match::Found {
                route: route.clone(),
                bindings,
            };
        }

        let allowed = self.allowed_segments(&segments);
        if allowed.is_empty() {
            Match::NotFound
        } else {
            Match::MethodNotAllowed { allowed }
        }
    }

    /// Methods with a route matching `path`, in canonical order.
    pub fn allowed(&self, path: &str) -> Vec<Method> {
        self.allowed_segments(&split_path(path))
    }

    fn allowed_segments(&self, segments: &[&str]) -> Vec<Method> {
        let mut allowed: Vec<Method> = self
            .trees
            .iter()
            .filter(|(_, tree)| tree.find(segments).is_some())
            .map(|(method, _)| method.clone())
            .collect();
        sort_methods(&mut allowed);
        allowed
    }

    pub fn routes(&self) -> &[Arc<Route>] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn list(&self) -> Vec<RouteSummary> {
        self.routes.iter().map(|route| route.summary()).collect()
    }
}
