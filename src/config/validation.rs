//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, status codes, addresses)
//! - Check static routes compile before the router is built
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PathwayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::PathwayConfig;
use crate::routing::{MediaType, RouteMethod, RoutePattern};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.log_level `{0}` is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("routes[{index}]: unknown method `{method}`")]
    RouteMethod { index: usize, method: String },

    #[error("routes[{index}]: {reason}")]
    RoutePattern { index: usize, reason: String },

    #[error("routes[{index}]: invalid status {status}")]
    RouteStatus { index: usize, status: u16 },

    #[error("routes[{index}]: invalid content type `{content_type}`")]
    RouteContentType { index: usize, content_type: String },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &PathwayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.server.bind_address.clone()));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(config.observability.log_level.clone()));
    }

    for (index, route) in config.routes.iter().enumerate() {
        if RouteMethod::parse(&route.method).is_none() {
            errors.push(ValidationError::RouteMethod {
                index,
                method: route.method.clone(),
            });
        }
        if let Err(e) = RoutePattern::parse(&route.path) {
            errors.push(ValidationError::RoutePattern {
                index,
                reason: e.to_string(),
            });
        }
        if StatusCode::from_u16(route.status).is_err() {
            errors.push(ValidationError::RouteStatus {
                index,
                status: route.status,
            });
        }
        if let Some(content_type) = &route.content_type {
            if MediaType::parse(content_type).is_err() {
                errors.push(ValidationError::RouteContentType {
                    index,
                    content_type: content_type.clone(),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
