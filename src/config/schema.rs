//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router
//! and its HTTP front end. All types derive Serde traits for deserialization
//! from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PathwayConfig {
    /// Matching and dispatch behavior.
    pub router: RouterConfig,

    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Static routes served from the config file.
    pub routes: Vec<StaticRouteConfig>,
}

/// What to do when the same method and pattern are registered twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Last registration wins; the replacement is logged.
    #[default]
    Override,
    /// The build fails.
    Reject,
}

/// Router behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Duplicate (method, pattern) handling.
    pub duplicate_routes: DuplicatePolicy,

    /// Answer unmatched `*/favicon.ico` requests with a dedicated outcome.
    pub favicon_fallback: bool,

    /// Check `Content-Type` / `Accept` against route `consumes` / `produces`.
    pub enforce_media_types: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            duplicate_routes: DuplicatePolicy::Override,
            favicon_fallback: true,
            enforce_media_types: true,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// A canned response bound to a route pattern.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticRouteConfig {
    /// Route name for diagnostics.
    #[serde(default)]
    pub name: Option<String>,

    /// HTTP method or `*`.
    #[serde(default = "default_method")]
    pub method: String,

    /// Route pattern, e.g. `/users/{id}`.
    pub path: String,

    /// Response status code.
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response content type; plain text when absent.
    #[serde(default)]
    pub content_type: Option<String>,

    /// Response body; `{var}` is replaced by the bound path variable.
    #[serde(default)]
    pub body: String,
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}
