//! Request dispatch.
//!
//! # Responsibilities
//! - Resolve (method, path) to a route or an explicit miss
//! - Enforce declared media types before running anything
//! - Bind variables into the context and run the route's pipeline
//! - Catch every failure, panics included, and classify it
//!
//! # Design Decisions
//! - Immutable after build (thread-safe without locks)
//! - Misses are outcomes, never errors
//! - The dispatcher never writes error bodies; the boundary layer does

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use futures_util::FutureExt;

use crate::config::schema::RouterConfig;
use crate::dispatch::builder::RouterBuilder;
use crate::dispatch::classify::ErrorClassifier;
use crate::dispatch::outcome::{Detached, Dispatch};
use crate::pipeline::{Context, Failure};
use crate::routing::{Match, MediaType, Route, RouteRegistry, RouteSummary};

const FAVICON: &str = "/favicon.ico";

pub struct Router {
    registry: RouteRegistry,
    classifier: Arc<ErrorClassifier>,
    config: RouterConfig,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    pub(crate) fn new(registry: RouteRegistry, classifier: ErrorClassifier, config: RouterConfig) -> Self {
        Self {
            registry,
            classifier: Arc::new(classifier),
            config,
        }
    }

    /// Look a request up without running anything.
    pub fn find(&self, method: &Method, path: &str) -> Match {
        self.registry.find(method, path)
    }

    /// Methods with a route for `path`, canonical order.
    pub fn allowed(&self, path: &str) -> Vec<Method> {
        self.registry.allowed(path)
    }

    /// Routes in registration order, overridden ones included.
    pub fn routes(&self) -> &[Arc<Route>] {
        self.registry.routes()
    }

    pub fn list_routes(&self) -> Vec<RouteSummary> {
        self.registry.list()
    }

    pub fn classify(&self, failure: &Failure) -> StatusCode {
        self.classifier.classify(failure)
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Dispatch one request.
    pub async fn dispatch(&self, ctx: &mut Context) -> Dispatch {
        let (route, bindings) = match self.registry.find(ctx.method(), ctx.path()) {
            Match::Found { route, bindings } => (route, bindings),
            Match::MethodNotAllowed { allowed } => {
                tracing::debug!(
                    method = %ctx.method(),
                    path = %ctx.path(),
                    "Method not allowed"
                );
                return Dispatch::MethodNotAllowed { allowed };
            }
            Match::NotFound => {
                tracing::debug!(method = %ctx.method(), path = %ctx.path(), "No route matched");
                if self.config.favicon_fallback && ctx.path().ends_with(FAVICON) {
                    return Dispatch::Favicon;
                }
                return Dispatch::NotFound;
            }
        };

        if self.config.enforce_media_types {
            if let Err(status) = negotiate(&route, ctx) {
                tracing::debug!(
                    route = %route.id(),
                    status = %status,
                    "Media type negotiation failed"
                );
                return Dispatch::Rejected(status);
            }
        }

        ctx.bind(route.clone(), bindings);
        let result = AssertUnwindSafe(async { route.pipeline().run(ctx).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(Failure::from_panic(payload)));

        match result {
            Ok(_) => match ctx.take_pending() {
                Some(pending) => {
                    tracing::debug!(route = %route.id(), "Route detached");
                    Dispatch::Detached(Detached::new(pending, self.classifier.clone()))
                }
                None => {
                    tracing::debug!(
                        route = %route.id(),
                        status = %ctx.status(),
                        "Request completed"
                    );
                    Dispatch::Completed
                }
            },
            Err(failure) => {
                let status = self.classifier.classify(&failure);
                if status.is_server_error() {
                    let detail = format!("{failure:#}");
                    tracing::error!(
                        route = %route.id(),
                        path = %ctx.path(),
                        status = %status,
                        error = %detail,
                        "Request failed"
                    );
                } else {
                    tracing::debug!(
                        route = %route.id(),
                        status = %status,
                        error = %failure,
                        "Request rejected"
                    );
                }
                Dispatch::Failed { status, failure }
            }
        }
    }
}

/// Check `Content-Type` against `consumes` and `Accept` against `produces`.
fn negotiate(route: &Route, ctx: &mut Context) -> Result<(), StatusCode> {
    if !route.consumes().is_empty() {
        if let Some(raw) = ctx.header(CONTENT_TYPE.as_str()) {
            let supported = MediaType::parse(raw)
                .map(|content_type| route.consumes().iter().any(|c| c.matches(&content_type)))
                .unwrap_or(false);
            if !supported {
                return Err(StatusCode::UNSUPPORTED_MEDIA_TYPE);
            }
        }
    }

    if route.produces().is_empty() {
        return Ok(());
    }

    let accepted = ctx
        .header(ACCEPT.as_str())
        .map(MediaType::parse_list)
        .unwrap_or_default();
    let chosen = if accepted.is_empty() {
        route.produces().first()
    } else {
        route
            .produces()
            .iter()
            .find(|produced| accepted.iter().any(|a| a.matches(produced)))
    };

    match chosen {
        None => Err(StatusCode::NOT_ACCEPTABLE),
        Some(media) if media.is_wildcard() => Ok(()),
        Some(media) => {
            let media = media.to_string();
            if let Err(err) = ctx.set_default_content_type(&media) {
                tracing::debug!(error = %err, "Could not set negotiated content type");
            }
            Ok(())
        }
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.registry.len())
            .field("classifier", &self.classifier)
            .field("config", &self.config)
            .finish()
    }
}

/// Aligned `METHOD  pattern` table in registration order.
impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes = self.registry.routes();
        let width = routes
            .iter()
            .map(|route| route.method().as_str().len())
            .max()
            .unwrap_or(0);

        for (i, route) in routes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:<width$}  {}", route.method().as_str(), route.path())?;
            if let Some(name) = route.name() {
                write!(f, "  ({name})")?;
            }
        }
        Ok(())
    }
}
