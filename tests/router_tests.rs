//! End-to-end behavior of registration, matching and dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::http::{Method, StatusCode};
use futures_util::FutureExt;
use pathway::dispatch::Completion;
use pathway::pipeline::{handler_fn, sync_fn, InvalidArgument, JsonRenderer, Value};
use pathway::routing::{Match, RouteMethod};
use pathway::{Context, Dispatch, Failure, Router, RouterBuilder};
use thiserror::Error;

mod common;

#[derive(Debug, Error)]
#[error("account {0} is locked")]
struct AccountLocked(u32);

#[test]
fn test_registered_routes_are_found_with_bindings() {
    let mut builder = Router::builder();
    builder.get("/orgs/{org}/repos/{repo}/issues/{number}", common::text("issue"));
    let router = builder.build().unwrap();

    match router.find(&Method::GET, "/orgs/rust/repos/cargo/issues/42") {
        Match::Found { route, bindings } => {
            assert_eq!(route.path(), "/orgs/{org}/repos/{repo}/issues/{number}");
            let pairs: Vec<_> = bindings.iter().collect();
            assert_eq!(
                pairs,
                vec![("org", "rust"), ("repo", "cargo"), ("number", "42")]
            );
        }
        other => panic!("expected a match, got {other:?}"),
    }
}

#[test]
fn test_literal_beats_parameter() {
    let mut builder = Router::builder();
    builder.get("/a/{x}", common::text("param"));
    builder.get("/a/b", common::text("literal"));
    let router = builder.build().unwrap();

    match router.find(&Method::GET, "/a/b") {
        Match::Found { route, bindings } => {
            assert_eq!(route.path(), "/a/b");
            assert!(bindings.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_method_mismatch() {
    let mut builder = Router::builder();
    builder.get("/x", common::text("x"));
    let router = builder.build().unwrap();

    let found = router.find(&Method::POST, "/x");
    assert!(found.method_mismatch());
    assert!(!found.is_found());
    assert_eq!(router.allowed("/x"), vec![Method::GET]);
    assert!(matches!(router.find(&Method::POST, "/y"), Match::NotFound));
}

#[test]
fn test_wildcard_binds_remainder() {
    let mut builder = Router::builder();
    builder.get("/files/*", common::text("file"));
    builder.get("/assets/{path}*", common::text("asset"));
    let router = builder.build().unwrap();

    match router.find(&Method::GET, "/files/a/b/c") {
        Match::Found { bindings, .. } => assert_eq!(bindings.get("*"), Some("a/b/c")),
        other => panic!("unexpected {other:?}"),
    }
    match router.find(&Method::GET, "/assets/css/site.css") {
        Match::Found { bindings, .. } => assert_eq!(bindings.get("path"), Some("css/site.css")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_regex_constraint() {
    let mut builder = Router::builder();
    builder.get("/p/{id:[0-9]+}", common::text("p"));
    let router = builder.build().unwrap();

    match router.find(&Method::GET, "/p/42") {
        Match::Found { bindings, .. } => assert_eq!(bindings.get("id"), Some("42")),
        other => panic!("unexpected {other:?}"),
    }
    assert!(!router.find(&Method::GET, "/p/x").is_found());
}

#[tokio::test]
async fn test_before_filters_nest() {
    let log = common::new_log();
    let mut builder = Router::builder();
    builder.filter(common::around_logger(&log, "F1"));
    builder.path("/api", |api| {
        api.filter(common::around_logger(&log, "F2"));
        api.get("/h", common::logged(&log, "ok"));
    });
    let router = builder.build().unwrap();

    let (outcome, ctx) = common::dispatch(&router, Method::GET, "/api/h").await;
    assert!(matches!(outcome, Dispatch::Completed));
    assert_eq!(common::body_text(&ctx), "ok");
    assert_eq!(
        common::entries(&log),
        vec!["F1-enter", "F2-enter", "handler", "F2-exit", "F1-exit"]
    );
}

#[tokio::test]
async fn test_after_filters_observe_failure_exactly_once() {
    let log = common::new_log();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut builder = Router::builder();
    builder.filter(common::after_logger(&log, "outer"));
    builder.group(|group| {
        group.filter(common::after_logger(&log, "inner"));
        group.get(
            "/fail",
            sync_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(InvalidArgument("bad input".into()).into())
            }),
        );
    });
    let router = builder.build().unwrap();

    let (outcome, ctx) = common::dispatch(&router, Method::GET, "/fail").await;
    assert_eq!(outcome.status(), Some(StatusCode::BAD_REQUEST));
    assert!(!ctx.is_committed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(common::entries(&log), vec!["inner-err", "outer-err"]);
}

#[tokio::test]
async fn test_after_filters_observe_handler_panic() {
    let log = common::new_log();
    let mut builder = Router::builder();
    builder.filter(common::after_logger(&log, "after"));
    builder.get("/boom", sync_fn(|_| panic!("bug")));
    let router = builder.build().unwrap();

    let (outcome, _) = common::dispatch(&router, Method::GET, "/boom").await;
    assert_eq!(outcome.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(common::entries(&log), vec!["after-err"]);
}

#[tokio::test]
async fn test_root_catch_all_serves_site_root() {
    let mut builder = Router::builder();
    builder.get("/*", common::text("app"));
    let router = builder.build().unwrap();

    let (outcome, ctx) = common::dispatch(&router, Method::GET, "/").await;
    assert!(matches!(outcome, Dispatch::Completed));
    assert_eq!(common::body_text(&ctx), "app");
}

#[tokio::test]
async fn test_group_filters_stay_in_group() {
    let log = common::new_log();
    let mut builder = Router::builder();
    builder.group(|group| {
        group.filter(common::around_logger(&log, "G"));
        group.get("/inside", common::text("in"));
    });
    builder.get("/outside", common::text("out"));
    let router = builder.build().unwrap();

    common::dispatch(&router, Method::GET, "/outside").await;
    assert!(common::entries(&log).is_empty());
    common::dispatch(&router, Method::GET, "/inside").await;
    assert_eq!(common::entries(&log), vec!["G-enter", "G-exit"]);
}

#[tokio::test]
async fn test_error_classification() {
    let mut builder = Router::builder();
    builder.error_code::<AccountLocked>(StatusCode::LOCKED);
    builder.get("/locked", sync_fn(|_| Err(AccountLocked(7).into())));
    builder.get(
        "/parse/{n}",
        sync_fn(|ctx| Ok(Value::Text(ctx.param_as::<u32>("n")?.to_string()))),
    );
    builder.get("/unknown", sync_fn(|_| Err(Failure::msg("disk on fire"))));
    let router = builder.build().unwrap();

    let (outcome, _) = common::dispatch(&router, Method::GET, "/locked").await;
    assert_eq!(outcome.status(), Some(StatusCode::LOCKED));

    let (outcome, _) = common::dispatch(&router, Method::GET, "/parse/abc").await;
    assert_eq!(outcome.status(), Some(StatusCode::BAD_REQUEST));

    let (outcome, ctx) = common::dispatch(&router, Method::GET, "/parse/12").await;
    assert!(matches!(outcome, Dispatch::Completed));
    assert_eq!(common::body_text(&ctx), "12");

    let (outcome, _) = common::dispatch(&router, Method::GET, "/unknown").await;
    assert_eq!(outcome.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
}

#[test]
fn test_list_routes_is_idempotent() {
    let mut builder = Router::builder();
    builder.get("/b", common::text("b"));
    builder.any("/a", common::text("a"));
    builder.post("/b", common::text("b"));
    let router = builder.build().unwrap();

    let first = router.list_routes();
    let second = router.list_routes();
    assert_eq!(first, second);

    let listed: Vec<_> = first
        .iter()
        .map(|summary| (summary.method.clone(), summary.pattern.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            (RouteMethod::Method(Method::GET), "/b"),
            (RouteMethod::Any, "/a"),
            (RouteMethod::Method(Method::POST), "/b"),
        ]
    );
}

#[tokio::test]
async fn test_detached_route_completes_later() {
    let log = common::new_log();
    let mut builder = Router::builder();
    builder.filter(common::after_logger(&log, "after"));
    builder.detach(|detached| {
        detached.post(
            "/jobs",
            handler_fn(|ctx| {
                async move {
                    tokio::task::yield_now().await;
                    ctx.set_status(StatusCode::ACCEPTED);
                    Ok(Value::Text("queued".into()))
                }
                .boxed()
            }),
        );
    });
    let router = builder.build().unwrap();

    let (outcome, ctx) = common::dispatch(&router, Method::POST, "/jobs").await;
    assert!(!ctx.is_committed());
    let Dispatch::Detached(detached) = outcome else {
        panic!("expected a detached outcome");
    };

    match detached.wait().await {
        Completion::Completed(finished) => {
            assert_eq!(finished.status(), StatusCode::ACCEPTED);
            assert_eq!(common::body_text(&finished), "queued");
        }
        Completion::Failed { failure, .. } => panic!("unexpected failure {failure}"),
    }
    assert_eq!(common::entries(&log), vec!["after-ok"]);
}

#[tokio::test]
async fn test_detached_failure_is_classified() {
    let mut builder = Router::builder();
    builder.error_code::<AccountLocked>(StatusCode::LOCKED);
    builder
        .delete("/accounts/{id}", sync_fn(|_| Err(AccountLocked(1).into())))
        .detach();
    let router = builder.build().unwrap();

    let (outcome, _) = common::dispatch(&router, Method::DELETE, "/accounts/1").await;
    let Dispatch::Detached(detached) = outcome else {
        panic!("expected a detached outcome");
    };
    match detached.wait().await {
        Completion::Failed { status, context, .. } => {
            assert_eq!(status, StatusCode::LOCKED);
            assert!(context.is_some());
        }
        Completion::Completed(_) => panic!("expected a failure"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dispatch_scope_runs_on_given_runtime() {
    let worker = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("pathway-worker")
        .enable_all()
        .build()
        .unwrap();

    let mut builder = Router::builder();
    builder.dispatch(worker.handle().clone(), |offloaded| {
        offloaded.get(
            "/heavy/{n}",
            sync_fn(|ctx| {
                let thread = std::thread::current().name().unwrap_or_default().to_string();
                Ok(Value::Text(format!("{} on {thread}", ctx.param("n")?)))
            }),
        );
    });
    let router = builder.build().unwrap();

    let (outcome, ctx) = common::dispatch(&router, Method::GET, "/heavy/3").await;
    assert!(matches!(outcome, Dispatch::Completed));
    assert_eq!(common::body_text(&ctx), "3 on pathway-worker");
    worker.shutdown_background();
}

#[tokio::test]
async fn test_renderers_innermost_first() {
    let mut builder = Router::builder();
    builder.renderer(|ctx: &mut Context, value: &Value| -> Result<bool, Failure> {
        if let Value::Text(text) = value {
            ctx.send(format!("<p>{text}</p>"))?;
            return Ok(true);
        }
        Ok(false)
    });
    builder.path("/api", |api| {
        api.renderer(JsonRenderer::default());
        api.get("/user", sync_fn(|_| Ok(Value::Json(serde_json::json!({"id": 1})))));
        api.get("/note", common::text("hi"));
    });
    let router = builder.build().unwrap();

    let (_, ctx) = common::dispatch(&router, Method::GET, "/api/user").await;
    assert_eq!(common::body_text(&ctx), r#"{"id":1}"#);

    let (_, ctx) = common::dispatch(&router, Method::GET, "/api/note").await;
    assert_eq!(common::body_text(&ctx), "<p>hi</p>");
}

#[test]
fn test_build_errors_are_reported_together() {
    let mut builder = RouterBuilder::new();
    builder.get("/x/*/y", common::text("x"));
    builder.get("/p/{id:[0-9]+}", common::text("p"));
    builder.get("/p/{id:[a-z]+}", common::text("p"));
    builder.open_scope("/never-closed", false);

    let err = builder.build().unwrap_err();
    assert_eq!(err.errors().len(), 3);
    let message = err.to_string();
    assert!(message.contains("must be the last segment"));
    assert!(message.contains("conflicts"));
    assert!(message.contains("still open"));
}

#[tokio::test]
async fn test_router_is_shareable_across_tasks() {
    let mut builder = Router::builder();
    builder.get("/n/{n}", sync_fn(|ctx| Ok(Value::Text(ctx.param("n")?.to_string()))));
    let router = Arc::new(builder.build().unwrap());

    let mut tasks = Vec::new();
    for n in 0..16 {
        let router = router.clone();
        tasks.push(tokio::spawn(async move {
            let (_, ctx) = common::dispatch(&router, Method::GET, &format!("/n/{n}")).await;
            common::body_text(&ctx) == n.to_string()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap());
    }
}
