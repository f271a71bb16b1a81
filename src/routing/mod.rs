//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at build):
//!     pattern string
//!     → pattern.rs (segments: literal / parameter / regex / wildcard)
//!     → registry.rs (Route + RouteId, one trie per method)
//!     → tree.rs insert
//!
//! Incoming Request (method, path):
//!     → pattern.rs split_path
//!     → tree.rs find (literal > parameter > wildcard, no backtracking)
//!     → registry.rs: Found { route, bindings } | MethodNotAllowed | NotFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at build time, immutable at runtime
//! - Regex only where a pattern asks for it, checked per segment
//! - Deterministic: same input always matches same route

pub mod bindings;
pub mod error;
pub mod media;
pub mod pattern;
pub mod registry;
pub mod tree;

pub use bindings::Bindings;
pub use error::{BuildError, RouteError};
pub use media::{InvalidMediaType, MediaType};
pub use pattern::{PatternError, RoutePattern, Segment};
pub use registry::{Match, Route, RouteId, RouteMethod, RouteRegistry, RouteSummary, METHODS};
