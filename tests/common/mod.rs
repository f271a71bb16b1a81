//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use axum::http::Method;
use futures_util::FutureExt;
use pathway::pipeline::{around_fn, sync_fn, Filter, Handler, HandlerResult, Value};
use pathway::{Context, Dispatch, Router};

/// Ordered record of what ran.
#[allow(dead_code)]
pub type Log = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn new_log() -> Log {
    Arc::default()
}

#[allow(dead_code)]
pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Handler answering with a fixed text.
pub fn text(body: &'static str) -> impl Handler {
    sync_fn(move |_| Ok(Value::Text(body.to_string())))
}

/// Handler that records itself and answers with `body`.
#[allow(dead_code)]
pub fn logged(log: &Log, body: &'static str) -> impl Handler {
    let log = log.clone();
    sync_fn(move |_| {
        log.lock().unwrap().push("handler".to_string());
        Ok(Value::Text(body.to_string()))
    })
}

/// Around filter logging `<name>-enter` / `<name>-exit`.
#[allow(dead_code)]
pub fn around_logger(log: &Log, name: &'static str) -> Filter {
    let log = log.clone();
    Filter::before(around_fn(move |ctx, next| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{name}-enter"));
            let result = next.run(ctx).await;
            log.lock().unwrap().push(format!("{name}-exit"));
            result
        }
        .boxed()
    }))
}

/// After filter logging `<name>-ok` or `<name>-err`.
#[allow(dead_code)]
pub fn after_logger(log: &Log, name: &'static str) -> Filter {
    let log = log.clone();
    Filter::after(move |_: &mut Context, result: HandlerResult| {
        let outcome = if result.is_ok() { "ok" } else { "err" };
        log.lock().unwrap().push(format!("{name}-{outcome}"));
        result
    })
}

/// Dispatch a bodiless request and hand back both outcome and context.
#[allow(dead_code)]
pub async fn dispatch(router: &Router, method: Method, path: &str) -> (Dispatch, Context) {
    let mut ctx = Context::new(method, path);
    let outcome = router.dispatch(&mut ctx).await;
    (outcome, ctx)
}

/// Response body as text.
#[allow(dead_code)]
pub fn body_text(ctx: &Context) -> String {
    String::from_utf8_lossy(&ctx.response().body).into_owned()
}
