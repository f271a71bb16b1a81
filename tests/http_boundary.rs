//! The axum front end, driven in-process.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use pathway::config::ServerConfig;
use pathway::pipeline::{sync_fn, Value};
use pathway::{Failure, HttpServer, Router};
use tower::ServiceExt;

mod common;

fn app(router: Router) -> axum::Router {
    let config = ServerConfig {
        max_body_bytes: 16,
        ..ServerConfig::default()
    };
    HttpServer::new(Arc::new(router), config).app()
}

fn sample() -> axum::Router {
    let mut builder = Router::builder();
    builder.get("/hello/{name}", sync_fn(|ctx| Ok(Value::Text(format!("hi {}", ctx.param("name")?)))));
    builder.post("/echo", sync_fn(|ctx| Ok(Value::Bytes(ctx.body().to_vec()))));
    builder
        .post("/json", common::text("ok"))
        .consumes("application/json")
        .produces("application/json");
    builder.get("/crash", sync_fn(|_| Err(Failure::msg("secret detail"))));
    builder.get("/bad", sync_fn(|ctx| Ok(Value::Text(ctx.param_as::<u8>("missing")?.to_string()))));
    builder.post("/jobs", common::text("done")).detach();
    app(builder.build().unwrap())
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_completed_route_response() {
    let response = sample().oneshot(request("GET", "/hello/ana")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_string(response).await, "hi ana");
}

#[tokio::test]
async fn test_not_found_and_method_not_allowed() {
    let response = sample().oneshot(request("GET", "/nowhere")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = sample().oneshot(request("DELETE", "/echo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");
}

#[tokio::test]
async fn test_favicon_is_bare_not_found() {
    let response = sample().oneshot(request("GET", "/static/favicon.ico")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "");
}

#[tokio::test]
async fn test_media_negotiation() {
    let wrong_type = Request::builder()
        .method("POST")
        .uri("/json")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::empty())
        .unwrap();
    let response = sample().oneshot(wrong_type).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let wrong_accept = Request::builder()
        .method("POST")
        .uri("/json")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ACCEPT, "text/html")
        .body(Body::empty())
        .unwrap();
    let response = sample().oneshot(wrong_accept).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);

    let accepted = Request::builder()
        .method("POST")
        .uri("/json")
        .header(header::CONTENT_TYPE, "application/json; charset=utf-8")
        .header(header::ACCEPT, "application/*")
        .body(Body::empty())
        .unwrap();
    let response = sample().oneshot(accepted).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_error_bodies() {
    let response = sample().oneshot(request("GET", "/crash")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert_eq!(body, "Internal Server Error");

    let response = sample().oneshot(request("GET", "/bad")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_string(response).await.contains("missing"));
}

#[tokio::test]
async fn test_request_body_round_trip_and_limit() {
    let small = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("ping"))
        .unwrap();
    let response = sample().oneshot(small).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ping");

    let large = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![b'x'; 64]))
        .unwrap();
    let response = sample().oneshot(large).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_detached_route_answers() {
    let response = sample().oneshot(request("POST", "/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "done");
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let tagged = Request::builder()
        .uri("/hello/bo")
        .header("x-request-id", "abc-123")
        .body(Body::empty())
        .unwrap();
    let response = sample().oneshot(tagged).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}
