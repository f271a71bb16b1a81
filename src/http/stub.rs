//! Canned responses declared in the config file.
//!
//! Each `[[routes]]` entry becomes a route whose handler answers with a fixed
//! status, content type and body. `{name}` in the body is replaced by the
//! value bound to that path variable.

use axum::http::StatusCode;
use futures_util::future::{self, BoxFuture};
use futures_util::FutureExt;

use crate::config::{StaticRouteConfig, ValidationError};
use crate::dispatch::RouterBuilder;
use crate::pipeline::{Context, Handler, HandlerResult, Value};
use crate::routing::RouteMethod;

pub struct StubHandler {
    status: StatusCode,
    content_type: Option<String>,
    body: String,
}

impl StubHandler {
    pub fn new(status: StatusCode, content_type: Option<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type,
            body: body.into(),
        }
    }

    fn respond(&self, ctx: &mut Context) -> HandlerResult {
        let body = ctx
            .bindings()
            .iter()
            .fold(self.body.clone(), |body, (name, value)| {
                body.replace(&format!("{{{name}}}"), value)
            });

        ctx.set_status(self.status);
        if let Some(content_type) = &self.content_type {
            ctx.set_content_type(content_type)?;
        }
        Ok(Value::Text(body))
    }
}

impl Handler for StubHandler {
    fn call<'a>(&'a self, ctx: &'a mut Context) -> BoxFuture<'a, HandlerResult> {
        future::ready(self.respond(ctx)).boxed()
    }
}

/// Register every configured stub route; returns how many were added.
pub fn mount_static_routes(
    builder: &mut RouterBuilder,
    routes: &[StaticRouteConfig],
) -> Result<usize, ValidationError> {
    for (index, route) in routes.iter().enumerate() {
        let method = RouteMethod::parse(&route.method).ok_or_else(|| ValidationError::RouteMethod {
            index,
            method: route.method.clone(),
        })?;
        let status = StatusCode::from_u16(route.status).map_err(|_| ValidationError::RouteStatus {
            index,
            status: route.status,
        })?;

        let handler = StubHandler::new(status, route.content_type.clone(), route.body.clone());
        let def = builder.route(method, &route.path, handler);
        if let Some(name) = &route.name {
            def.name(name.clone());
        }
    }
    Ok(routes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatch;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::Method;

    fn stub(method: &str, path: &str, body: &str) -> StaticRouteConfig {
        StaticRouteConfig {
            name: Some(format!("{method} {path}")),
            method: method.to_string(),
            path: path.to_string(),
            status: 200,
            content_type: None,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_body_substitutes_bindings() {
        let mut builder = RouterBuilder::new();
        let mut created = stub("POST", "/items/{kind}/{id}", "created {kind} #{id}");
        created.status = 201;
        created.content_type = Some("text/markdown".to_string());
        mount_static_routes(&mut builder, &[created]).unwrap();
        let router = builder.build().unwrap();

        let mut ctx = Context::new(Method::POST, "/items/book/12");
        assert!(matches!(router.dispatch(&mut ctx).await, Dispatch::Completed));
        assert_eq!(ctx.status(), StatusCode::CREATED);
        assert_eq!(ctx.response().body, b"created book #12");
        assert_eq!(ctx.response().headers[CONTENT_TYPE], "text/markdown");
        assert_eq!(router.routes()[0].name(), Some("POST /items/{kind}/{id}"));
    }

    #[test]
    fn test_bad_method_is_reported() {
        let mut builder = RouterBuilder::new();
        let err = mount_static_routes(&mut builder, &[stub("GET", "/", ""), stub("NO PE", "/x", "")])
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::RouteMethod {
                index: 1,
                method: "NO PE".to_string()
            }
        );
    }
}
