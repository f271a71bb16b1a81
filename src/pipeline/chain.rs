//! Composing one route's executable pipeline.
//!
//! # Responsibilities
//! - Partition declared filters by kind
//! - Nest before filters around the inner segment
//! - Run handler, after filters and renderer as the inner segment
//!
//! # Design Decisions
//! - Composition happens once at build time; requests only walk pointers
//! - After filters run innermost-declared first so the outermost one
//!   observes the final result
//! - A handler panic is caught in the inner segment so after filters still
//!   see it as a failure

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::pipeline::context::Context;
use crate::pipeline::filter::Filter;
use crate::pipeline::handler::{After, Around, Handler, HandlerResult, Next};
use crate::pipeline::offload::{run_guarded, Detach};
use crate::pipeline::render::{Renderer, RendererChain};

/// Handler, then after filters, then rendering.
pub struct Terminal {
    handler: Arc<dyn Handler>,
    afters: Vec<Arc<dyn After>>,
    renderers: RendererChain,
}

impl Handler for Terminal {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        async move {
            let result = run_guarded(&*self.handler, ctx).await;
            let result = self
                .afters
                .iter()
                .fold(result, |result, after| after.after(ctx, result));

            let value = result?;
            if !ctx.is_committed() {
                self.renderers.render(ctx, &value)?;
            }
            Ok(value)
        }
        .boxed()
    }
}

/// One before filter bound to its downstream segment.
struct Wrapped {
    filter: Arc<dyn Around>,
    next: Arc<dyn Handler>,
}

impl Handler for Wrapped {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        self.filter.call(ctx, Next::new(self.next.clone()))
    }
}

/// Executable pipeline for one route, shared by every request to it.
#[derive(Clone)]
pub struct Pipeline {
    entry: Arc<dyn Handler>,
    filters: usize,
    renderers: usize,
}

impl Pipeline {
    /// Compose from filters and renderers in declaration order (outermost first).
    pub fn compose(
        handler: Arc<dyn Handler>,
        filters: &[Filter],
        renderers: Vec<Arc<dyn Renderer>>,
        detached: bool,
    ) -> Self {
        let mut befores = Vec::new();
        let mut afters = Vec::new();
        for filter in filters {
            match filter {
                Filter::Before(around) => befores.push(around.clone()),
                Filter::After(after) => afters.push(after.clone()),
            }
        }
        afters.reverse();

        let renderers = RendererChain::new(renderers);
        let renderer_count = renderers.len();
        let terminal: Arc<dyn Handler> = Arc::new(Terminal {
            handler,
            afters,
            renderers,
        });

        let mut entry: Arc<dyn Handler> = if detached {
            Arc::new(Detach::new(terminal))
        } else {
            terminal
        };
        for filter in befores.into_iter().rev() {
            entry = Arc::new(Wrapped { filter, next: entry });
        }

        Self {
            entry,
            filters: filters.len(),
            renderers: renderer_count,
        }
    }

    /// A pipeline with no filters and the default renderer.
    pub fn handler(handler: impl Handler) -> Self {
        Self::compose(Arc::new(handler), &[], Vec::new(), false)
    }

    pub fn run<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        self.entry.call(ctx)
    }

    pub fn filter_count(&self) -> usize {
        self.filters
    }

    pub fn renderer_count(&self) -> usize {
        self.renderers
    }
}
