//! Registration and dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouterBuilder (scopes, routes, error rules)
//!     → builder.rs build()
//!     → Router (registry + classifier, immutable, shared via Arc)
//!
//! Request:
//!     Router::dispatch(&mut Context)
//!     → registry lookup → MethodNotAllowed | NotFound | Favicon
//!     → media negotiation → Rejected(415 | 406)
//!     → pipeline run (panics caught here)
//!     → Completed | Detached | Failed { classify.rs status }
//! ```
//!
//! # Design Decisions
//! - One catch point for failures per request
//! - Classification rules are fixed at build time

pub mod builder;
pub mod classify;
pub mod outcome;
pub mod router;

pub use builder::{RouteDef, RouterBuilder};
pub use classify::ErrorClassifier;
pub use outcome::{Completion, Detached, Dispatch};
pub use router::Router;
