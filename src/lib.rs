//! pathway: an embeddable HTTP routing and dispatch core.
//!
//! # Architecture Overview
//!
//! ```text
//!   registration (startup)                      request (runtime)
//!   ──────────────────────                      ─────────────────
//!   RouterBuilder                               http::HttpServer (axum, optional)
//!     │ path / group / detach / dispatch          │ Context { method, path, headers, body }
//!     │ before / after / around / renderer        ▼
//!     ▼                                         dispatch::Router::dispatch
//!   pipeline::ScopeStack ──linearize──┐           │ routing::RouteRegistry::find
//!                                     ▼           │   tree.rs: literal > param > wildcard
//!   routing::RoutePattern ──► routing::Route      ▼
//!                              (Pipeline)       pipeline::Pipeline::run
//!                                     │           │ before filters → handler → after → render
//!                                     ▼           ▼
//!                          dispatch::Router    Dispatch { Completed | Detached | Failed
//!                          (immutable, Arc)               | MethodNotAllowed | NotFound | ... }
//!                                                 │ failures: dispatch::ErrorClassifier
//! ```
//!
//! # Example
//!
//! ```ignore
//! use futures_util::FutureExt;
//! use pathway::prelude::*;
//!
//! let mut builder = Router::builder();
//! builder.path("/users", |users| {
//!     users.get("/{id}", handler_fn(|ctx| async move {
//!         Ok(format!("user {}", ctx.param("id")?).into())
//!     }.boxed()));
//! });
//! let router = builder.build()?;
//! ```

pub mod config;
pub mod dispatch;
pub mod http;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use config::PathwayConfig;
pub use dispatch::{Dispatch, Router, RouterBuilder};
pub use http::HttpServer;
pub use pipeline::{Context, Failure};

/// Everything needed to declare routes and handlers.
pub mod prelude {
    pub use crate::dispatch::{Completion, Dispatch, Router, RouterBuilder};
    pub use crate::pipeline::{
        around_fn, before_fn, handler_fn, sync_fn, Context, Failure, Filter, HandlerResult,
        InvalidArgument, JsonRenderer, MissingValue, Next, ResourceNotFound, StatusError, Value,
    };
    pub use crate::routing::{Match, RouteMethod};
}
