//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount a built [`Router`] as the axum fallback service
//! - Wire up middleware (tracing, timeout, request ID)
//! - Translate axum requests into a `Context` and dispatch outcomes into
//!   responses
//! - Bind server to listener and shut down gracefully
//!
//! # Design Decisions
//! - One fallback handler; axum's own routing is not used
//! - Detached routes are awaited here so the client still gets their response
//! - Error bodies are written here and only here

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::ALLOW, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{Completion, Dispatch, Router};
use crate::pipeline::{Context, Failure};

/// Application state injected into the fallback handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub max_body_bytes: usize,
}

/// HTTP front end for a [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: ServerConfig,
}

impl HttpServer {
    /// Create a new HTTP server serving `router`.
    pub fn new(router: Arc<Router>, config: ServerConfig) -> Self {
        let state = AppState {
            router,
            max_body_bytes: config.max_body_bytes,
        };
        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &ServerConfig, state: AppState) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The axum app, for embedding or in-process testing.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run until Ctrl+C.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        self.run_until(listener, shutdown_signal()).await
    }

    /// Run until `shutdown` resolves, then drain in-flight requests.
    pub async fn run_until<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Every request lands here.
async fn dispatch_handler(State(state): State<AppState>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::debug!(error = %err, limit = state.max_body_bytes, "Request body rejected");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    let mut ctx = Context::new(parts.method, parts.uri.path())
        .with_headers(parts.headers)
        .with_body(bytes.to_vec());
    ctx.extensions_mut().extend(parts.extensions);

    let outcome = state.router.dispatch(&mut ctx).await;
    outcome_response(ctx, outcome).await
}

async fn outcome_response(mut ctx: Context, outcome: Dispatch) -> Response {
    match outcome {
        Dispatch::Completed => context_response(&mut ctx),
        Dispatch::Detached(detached) => match detached.wait().await {
            Completion::Completed(mut finished) => context_response(&mut finished),
            Completion::Failed {
                status, failure, ..
            } => error_response(status, &failure),
        },
        Dispatch::Failed { status, failure } => error_response(status, &failure),
        Dispatch::MethodNotAllowed { allowed } => {
            let allow = allowed
                .iter()
                .map(Method::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let mut response = status_response(StatusCode::METHOD_NOT_ALLOWED);
            if let Ok(value) = HeaderValue::from_str(&allow) {
                response.headers_mut().insert(ALLOW, value);
            }
            response
        }
        Dispatch::Favicon => StatusCode::NOT_FOUND.into_response(),
        Dispatch::NotFound => status_response(StatusCode::NOT_FOUND),
        Dispatch::Rejected(status) => status_response(status),
    }
}

fn context_response(ctx: &mut Context) -> Response {
    let state = ctx.take_response();
    let mut response = Response::new(Body::from(state.body));
    *response.status_mut() = state.status;
    *response.headers_mut() = state.headers;
    response
}

fn status_response(status: StatusCode) -> Response {
    (status, status.canonical_reason().unwrap_or("Error")).into_response()
}

/// Client errors echo the failure message; server errors stay generic.
fn error_response(status: StatusCode, failure: &Failure) -> Response {
    if status.is_client_error() {
        (status, failure.to_string()).into_response()
    } else {
        status_response(status)
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
