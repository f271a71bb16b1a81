//! Running pipeline segments on other tasks.
//!
//! # Responsibilities
//! - Detach: fork the context, spawn the inner segment and return at once
//! - Offload: run everything downstream on a caller-supplied runtime and
//!   await it
//!
//! # Design Decisions
//! - A detached task reports back through a oneshot; nothing is cancelled
//!   when the receiver goes away
//! - Panics on either path become failures instead of tearing down the
//!   calling task

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::pipeline::context::Context;
use crate::pipeline::failure::Failure;
use crate::pipeline::handler::{Around, Handler, HandlerResult, Next, Value};

/// Outcome of a detached segment.
#[derive(Debug)]
pub struct Finished {
    pub context: Context,
    pub result: HandlerResult,
}

/// Receiver for a detached segment's outcome.
pub struct Pending {
    rx: oneshot::Receiver<Finished>,
}

impl Pending {
    /// `None` when the task was dropped before reporting, e.g. on runtime shutdown.
    pub async fn finish(self) -> Option<Finished> {
        self.rx.await.ok()
    }
}

impl fmt::Debug for Pending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pending").finish_non_exhaustive()
    }
}

/// Runs a handler to completion, turning a panic into a failure.
///
/// The call itself happens inside the guarded future so synchronous
/// handlers that panic before returning a future are caught too.
pub(crate) async fn run_guarded(handler: &dyn Handler, ctx: &mut Context) -> HandlerResult {
    AssertUnwindSafe(async move { handler.call(ctx).await })
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(Failure::from_panic(payload)))
}

/// Spawns the wrapped segment on the current runtime.
pub struct Detach {
    inner: Arc<dyn Handler>,
}

impl Detach {
    pub fn new(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }
}

impl Handler for Detach {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        async move {
            let runtime = Handle::try_current()?;
            let mut forked = ctx.fork();
            let inner = self.inner.clone();
            let (tx, rx) = oneshot::channel();

            runtime.spawn(async move {
                let result = run_guarded(&*inner, &mut forked).await;
                if tx.send(Finished { context: forked, result }).is_err() {
                    tracing::debug!("Detached result dropped, nobody waiting");
                }
            });

            ctx.set_pending(Pending { rx });
            Ok(Value::Empty)
        }
        .boxed()
    }
}

/// Moves the downstream segment onto another runtime and waits for it.
pub struct Offload {
    runtime: Handle,
}

impl Offload {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }
}

impl Around for Offload {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        async move {
            let owned = std::mem::take(ctx);
            let task = self.runtime.spawn(async move {
                let mut owned = owned;
                let result = next.run(&mut owned).await;
                (owned, result)
            });

            match task.await {
                Ok((owned, result)) => {
                    *ctx = owned;
                    result
                }
                Err(err) if err.is_panic() => Err(Failure::from_panic(err.into_panic())),
                Err(err) => Err(err.into()),
            }
        }
        .boxed()
    }
}
