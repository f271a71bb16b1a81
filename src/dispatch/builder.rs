//! Route registration.
//!
//! # Responsibilities
//! - Collect route declarations under nested scopes
//! - Snapshot each route's prefix, filters and renderers when it is declared
//! - Compile everything into an immutable [`Router`] in one step
//!
//! # Design Decisions
//! - The builder is owned and consumed by `build`, so a built router can
//!   never be registered into again
//! - Registration never fails eagerly; every problem is collected and
//!   reported together by `build`
//! - Route ids are registration indices

use std::error::Error as StdError;
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures_util::future::BoxFuture;
use tokio::runtime::Handle;

use crate::config::schema::RouterConfig;
use crate::dispatch::classify::ErrorClassifier;
use crate::dispatch::router::Router;
use crate::pipeline::handler::{around_fn, before_fn};
use crate::pipeline::{
    Context, Failure, Filter, Handler, HandlerResult, Linearized, Next, Offload, Pipeline,
    Renderer, ScopeStack,
};
use crate::routing::{
    BuildError, MediaType, Route, RouteError, RouteId, RouteMethod, RoutePattern, RouteRegistry,
};

/// One declared route, before compilation.
pub struct RouteDef {
    method: RouteMethod,
    linearized: Linearized,
    handler: Arc<dyn Handler>,
    name: Option<String>,
    produces: Vec<String>,
    consumes: Vec<String>,
    detach: bool,
}

impl RouteDef {
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Declare a media type this route can respond with.
    pub fn produces(&mut self, media_type: impl Into<String>) -> &mut Self {
        self.produces.push(media_type.into());
        self
    }

    /// Declare a request media type this route accepts.
    pub fn consumes(&mut self, media_type: impl Into<String>) -> &mut Self {
        self.consumes.push(media_type.into());
        self
    }

    /// Run this route's handler on its own task.
    pub fn detach(&mut self) -> &mut Self {
        self.detach = true;
        self
    }

    /// Full pattern, scope prefixes included.
    pub fn pattern(&self) -> &str {
        &self.linearized.pattern
    }

    fn compile(self, id: RouteId) -> Result<Route, Vec<RouteError>> {
        let mut errors = Vec::new();
        let source = self.linearized.pattern;

        let pattern = RoutePattern::parse(&source)
            .map_err(|source_err| {
                errors.push(RouteError::Pattern {
                    method: self.method.clone(),
                    pattern: source.clone(),
                    source: source_err,
                })
            })
            .ok();

        let mut media = |declared: Vec<String>| -> Vec<MediaType> {
            declared
                .iter()
                .filter_map(|raw| match MediaType::parse(raw) {
                    Ok(media) => Some(media),
                    Err(err) => {
                        errors.push(RouteError::InvalidMediaType {
                            pattern: source.clone(),
                            source: err,
                        });
                        None
                    }
                })
                .collect()
        };
        let produces = media(self.produces);
        let consumes = media(self.consumes);

        let pattern = match pattern {
            Some(pattern) if errors.is_empty() => pattern,
            _ => return Err(errors),
        };

        let detached = self.detach || self.linearized.detach;
        let pipeline = Pipeline::compose(
            self.handler,
            &self.linearized.filters,
            self.linearized.renderers,
            detached,
        );

        Ok(Route {
            id,
            method: self.method,
            pattern,
            source,
            name: self.name,
            produces,
            consumes,
            detached,
            pipeline,
        })
    }
}

pub struct RouterBuilder {
    config: RouterConfig,
    scopes: ScopeStack,
    routes: Vec<RouteDef>,
    errors: Vec<RouteError>,
    classifier: ErrorClassifier,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self {
            config,
            scopes: ScopeStack::new(),
            routes: Vec::new(),
            errors: Vec::new(),
            classifier: ErrorClassifier::new(),
        }
    }

    /// Declare a route under every open scope.
    pub fn route(
        &mut self,
        method: impl Into<RouteMethod>,
        pattern: &str,
        handler: impl Handler,
    ) -> &mut RouteDef {
        let method = method.into();
        let linearized = self.scopes.linearize(pattern);
        tracing::debug!(method = %method, pattern = %linearized.pattern, "Route declared");

        let index = self.routes.len();
        self.routes.push(RouteDef {
            method,
            linearized,
            handler: Arc::new(handler),
            name: None,
            produces: Vec::new(),
            consumes: Vec::new(),
            detach: false,
        });
        &mut self.routes[index]
    }

    pub fn get(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::PUT, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::DELETE, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::PATCH, pattern, handler)
    }

    pub fn head(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::HEAD, pattern, handler)
    }

    pub fn options(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(Method::OPTIONS, pattern, handler)
    }

    /// Every method in [`METHODS`](crate::routing::METHODS).
    pub fn any(&mut self, pattern: &str, handler: impl Handler) -> &mut RouteDef {
        self.route(RouteMethod::Any, pattern, handler)
    }

    pub fn open_scope(&mut self, prefix: &str, detach: bool) -> &mut Self {
        self.scopes.open(prefix, detach);
        self
    }

    pub fn close_scope(&mut self) -> &mut Self {
        if let Err(err) = self.scopes.close() {
            self.errors.push(err);
        }
        self
    }

    /// Routes declared in `f` get `prefix` in front of their pattern.
    pub fn path(&mut self, prefix: &str, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.open_scope(prefix, false);
        f(self);
        self.close_scope()
    }

    /// Filters and renderers declared in `f` stay inside `f`.
    pub fn group(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.path("", f)
    }

    /// Routes declared in `f` run detached.
    pub fn detach(&mut self, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.open_scope("", true);
        f(self);
        self.close_scope()
    }

    /// Everything downstream of this point runs on `runtime`.
    pub fn dispatch(&mut self, runtime: Handle, f: impl FnOnce(&mut Self)) -> &mut Self {
        self.open_scope("", false);
        self.filter(Filter::before(Offload::new(runtime)));
        f(self);
        self.close_scope()
    }

    pub fn filter(&mut self, filter: Filter) -> &mut Self {
        self.scopes.add_filter(filter);
        self
    }

    /// A synchronous check run before everything downstream.
    pub fn before<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context) -> Result<(), Failure> + Send + Sync + 'static,
    {
        self.filter(Filter::before(before_fn(f)))
    }

    pub fn after<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn(&mut Context, HandlerResult) -> HandlerResult + Send + Sync + 'static,
    {
        self.filter(Filter::after(f))
    }

    pub fn around<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
    {
        self.filter(Filter::before(around_fn(f)))
    }

    pub fn renderer(&mut self, renderer: impl Renderer) -> &mut Self {
        self.scopes.add_renderer(Arc::new(renderer));
        self
    }

    /// Failures of type `E` anywhere in the source chain map to `status`.
    pub fn error_code<E>(&mut self, status: StatusCode) -> &mut Self
    where
        E: StdError + 'static,
    {
        self.classifier.register::<E>(status);
        self
    }

    pub fn error_rule<P>(&mut self, predicate: P, status: StatusCode) -> &mut Self
    where
        P: Fn(&(dyn StdError + 'static)) -> bool + Send + Sync + 'static,
    {
        self.classifier.register_rule(predicate, status);
        self
    }

    pub fn build(self) -> Result<Router, BuildError> {
        let RouterBuilder {
            config,
            scopes,
            routes,
            mut errors,
            classifier,
        } = self;

        if scopes.depth() > 0 {
            errors.push(RouteError::UnclosedScope {
                depth: scopes.depth(),
            });
        }

        let mut registry = RouteRegistry::new(config.duplicate_routes);
        for (index, def) in routes.into_iter().enumerate() {
            match def.compile(RouteId(index)) {
                Ok(route) => {
                    if let Err(err) = registry.insert(route) {
                        errors.push(err);
                    }
                }
                Err(mut compile_errors) => errors.append(&mut compile_errors),
            }
        }

        if !errors.is_empty() {
            tracing::error!(errors = errors.len(), "Router build failed");
            return Err(BuildError::new(errors));
        }

        tracing::info!(
            routes = registry.len(),
            error_rules = classifier.len(),
            "Router built"
        );
        Ok(Router::new(registry, classifier, config))
    }
}
