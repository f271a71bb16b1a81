//! Execution pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Registration:
//!     ScopeStack (open frames)
//!     → scope.rs linearize (prefix, filters, renderers, detach)
//!     → chain.rs Pipeline::compose
//!
//! Request:
//!     Pipeline::run(&mut Context)
//!     → before[0] → before[1] → ... (filter.rs, handler.rs Next)
//!     → [Detach: fork + spawn] (offload.rs)
//!     → Terminal: handler → after filters (reverse) → RendererChain (render.rs)
//!     → HandlerResult (Value or Failure)
//! ```
//!
//! # Design Decisions
//! - Pipelines are composed once and shared read-only by every request
//! - One error type, `Failure`, crosses every contract
//! - Rendering only happens for successful, uncommitted responses

pub mod chain;
pub mod context;
pub mod failure;
pub mod filter;
pub mod handler;
pub mod offload;
pub mod render;
pub mod scope;

pub use chain::Pipeline;
pub use context::{Context, ResponseState};
pub use failure::{
    AlreadySent, Failure, InvalidArgument, MissingValue, Panicked, ResourceNotFound, StatusError,
};
pub use filter::{Filter, FilterKind};
pub use handler::{
    around_fn, before_fn, handler_fn, sync_fn, After, Around, Handler, HandlerResult, Next, Value,
};
pub use offload::{Detach, Finished, Offload, Pending};
pub use render::{JsonRenderer, Renderer, RendererChain, TextRenderer};
pub use scope::{Linearized, ScopeFrame, ScopeStack};
