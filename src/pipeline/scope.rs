//! Nested registration scopes.
//!
//! # Responsibilities
//! - Keep the stack of open frames while routes are being declared
//! - Linearize every open frame into one route's prefix, filters and
//!   renderers at the moment the route is declared
//!
//! # Design Decisions
//! - The root frame always exists and can never be closed
//! - Linearization snapshots the frames; filters added later in the same
//!   scope do not reach routes declared before them

use std::sync::Arc;

use crate::pipeline::filter::Filter;
use crate::pipeline::render::Renderer;
use crate::routing::pattern::join;
use crate::routing::RouteError;

#[derive(Clone, Default)]
pub struct ScopeFrame {
    prefix: String,
    filters: Vec<Filter>,
    renderers: Vec<Arc<dyn Renderer>>,
    detach: bool,
}

impl ScopeFrame {
    pub fn new(prefix: impl Into<String>, detach: bool) -> Self {
        Self {
            prefix: prefix.into(),
            detach,
            ..Self::default()
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_detached(&self) -> bool {
        self.detach
    }
}

/// Everything the open frames contribute to one route.
#[derive(Clone)]
pub struct Linearized {
    pub pattern: String,
    pub filters: Vec<Filter>,
    pub renderers: Vec<Arc<dyn Renderer>>,
    pub detach: bool,
}

pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    pub fn new() -> Self {
        Self {
            frames: vec![ScopeFrame::default()],
        }
    }

    pub fn open(&mut self, prefix: impl Into<String>, detach: bool) {
        self.frames.push(ScopeFrame::new(prefix, detach));
    }

    pub fn close(&mut self) -> Result<ScopeFrame, RouteError> {
        if self.frames.len() == 1 {
            return Err(RouteError::ScopeUnderflow);
        }
        self.frames.pop().ok_or(RouteError::ScopeUnderflow)
    }

    /// Open frames, not counting the root.
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }

    pub fn add_filter(&mut self, filter: Filter) {
        self.top().filters.push(filter);
    }

    pub fn add_renderer(&mut self, renderer: Arc<dyn Renderer>) {
        self.top().renderers.push(renderer);
    }

    fn top(&mut self) -> &mut ScopeFrame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    /// Combine all open frames, outermost first, with a route's own pattern.
    pub fn linearize(&self, pattern: &str) -> Linearized {
        let prefix = self
            .frames
            .iter()
            .fold(String::new(), |acc, frame| join(&acc, &frame.prefix));

        Linearized {
            pattern: join(&prefix, pattern),
            filters: self.frames.iter().flat_map(|f| f.filters.iter().cloned()).collect(),
            renderers: self
                .frames
                .iter()
                .flat_map(|f| f.renderers.iter().cloned())
                .collect(),
            detach: self.frames.iter().any(|f| f.detach),
        }
    }
}
