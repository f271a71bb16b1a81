//! HTTP boundary subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, trace, timeout)
//!     → fallback handler: body → Context
//!     → dispatch::Router::dispatch
//!     → Dispatch outcome → status, headers, body
//!     → Send to client
//! ```
//!
//! stub.rs turns `[[routes]]` config entries into handlers.

pub mod server;
pub mod stub;

pub use server::{AppState, HttpServer};
pub use stub::{mount_static_routes, StubHandler};
