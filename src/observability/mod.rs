//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (registration, build, dispatch outcome)
//!     → tower-http TraceLayer spans per request (http::server)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, EnvFilter)
//! ```
//!
//! # Design Decisions
//! - Structured fields (`route`, `status`, `path`) on every dispatch event
//! - Request ID flows in through the `x-request-id` header
//! - Server errors log at error level, client errors at debug

pub mod logging;
