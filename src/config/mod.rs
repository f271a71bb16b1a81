//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PathwayConfig (validated, immutable)
//!     → RouterConfig into RouterBuilder, ServerConfig into HttpServer
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the router is built from it once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    DuplicatePolicy, ObservabilityConfig, PathwayConfig, RouterConfig, ServerConfig,
    StaticRouteConfig,
};
pub use validation::{validate_config, ValidationError};
