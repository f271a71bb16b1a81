//! Handler and filter contracts.
//!
//! # Responsibilities
//! - Define what a route handler, an around filter and an after filter are
//! - Adapt plain closures into those contracts
//!
//! # Design Decisions
//! - Handlers borrow the context for the duration of the returned future
//! - `Next` owns the downstream segment so a filter may move it onto another
//!   task
//! - After filters are synchronous and see failures as well as values

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;
use serde::Serialize;

use crate::pipeline::context::Context;
use crate::pipeline::failure::Failure;

pub type HandlerResult = Result<Value, Failure>;

/// What a handler produced, before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Empty,
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl Value {
    /// Serialize any value into [`Value::Json`].
    pub fn json<T: Serialize>(value: &T) -> Result<Self, Failure> {
        Ok(Value::Json(serde_json::to_value(value)?))
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Empty
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::Json(json)
    }
}

pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult>;
}

impl<H: Handler + ?Sized> Handler for Arc<H> {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (**self).call(ctx)
    }
}

/// Async closure handler, see [`handler_fn`].
pub struct FnHandler<F>(F);

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx)
    }
}

/// Wrap a closure returning a boxed future.
///
/// ```ignore
/// handler_fn(|ctx| async move { Ok(format!("user {}", ctx.param("id")?).into()) }.boxed())
/// ```
pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: for<'a> Fn(&'a mut Context) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    FnHandler(f)
}

/// Blocking-free synchronous handler, see [`sync_fn`].
pub struct SyncHandler<F>(F);

impl<F> Handler for SyncHandler<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        future::ready((self.0)(ctx)).boxed()
    }
}

pub fn sync_fn<F>(f: F) -> SyncHandler<F>
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    SyncHandler(f)
}

/// The rest of the pipeline, handed to an around filter.
pub struct Next {
    inner: Arc<dyn Handler>,
}

impl Next {
    pub(crate) fn new(inner: Arc<dyn Handler>) -> Self {
        Self { inner }
    }

    pub fn run(self, ctx: &mut Context) -> BoxFuture<'_, HandlerResult> {
        async move { self.inner.call(ctx).await }.boxed()
    }
}

/// A filter that wraps everything downstream of it.
pub trait Around: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next) -> BoxFuture<'a, HandlerResult>;
}

pub struct AroundFn<F>(F);

impl<F> Around for AroundFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx, next)
    }
}

pub fn around_fn<F>(f: F) -> AroundFn<F>
where
    F: for<'a> Fn(&'a mut Context, Next) -> BoxFuture<'a, HandlerResult> + Send + Sync + 'static,
{
    AroundFn(f)
}

/// Runs a synchronous check and then continues; an error short-circuits.
pub struct BeforeFn<F>(F);

impl<F> Around for BeforeFn<F>
where
    F: Fn(&mut Context) -> Result<(), Failure> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut Context, next: Next) -> BoxFuture<'a, HandlerResult> {
        async move {
            (self.0)(&mut *ctx)?;
            next.run(ctx).await
        }
        .boxed()
    }
}

pub fn before_fn<F>(f: F) -> BeforeFn<F>
where
    F: Fn(&mut Context) -> Result<(), Failure> + Send + Sync + 'static,
{
    BeforeFn(f)
}

/// Observes or replaces the result of the handler.
pub trait After: Send + Sync + 'static {
    fn after(&self, ctx: &mut Context, result: HandlerResult) -> HandlerResult;
}

impl<F> After for F
where
    F: Fn(&mut Context, HandlerResult) -> HandlerResult + Send + Sync + 'static,
{
    fn after(&self, ctx: &mut Context, result: HandlerResult) -> HandlerResult {
        self(ctx, result)
    }
}
