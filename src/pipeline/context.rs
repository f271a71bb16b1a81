//! Per-request execution context.
//!
//! # Responsibilities
//! - Hold the parsed request (method, path, headers, body)
//! - Expose path bindings and the matched route once dispatch has bound them
//! - Accumulate response state until the boundary layer turns it into bytes
//!
//! # Design Decisions
//! - One context per request, owned by the boundary layer and lent to the
//!   pipeline as `&mut`
//! - A response commits at most once; a second `send` is an error
//! - Detached work gets a fork so the caller's context stays usable

use std::str::FromStr;
use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::{Extensions, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};

use crate::pipeline::failure::{AlreadySent, Failure, MissingValue};
use crate::pipeline::offload::Pending;
use crate::routing::{Bindings, Route};

/// Response being assembled by the pipeline.
#[derive(Debug, Clone)]
pub struct ResponseState {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    committed: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            committed: false,
        }
    }
}

impl ResponseState {
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

#[derive(Debug)]
pub struct Context {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Vec<u8>,
    bindings: Bindings,
    route: Option<Arc<Route>>,
    response: ResponseState,
    extensions: Extensions,
    pending: Option<Pending>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Method::GET, "/")
    }
}

impl Context {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            bindings: Bindings::new(),
            route: None,
            response: ResponseState::default(),
            extensions: Extensions::new(),
            pending: None,
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text; non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// A bound path variable.
    pub fn param(&self, name: &str) -> Result<&str, MissingValue> {
        self.bindings.get(name).ok_or_else(|| MissingValue::new(name))
    }

    /// A bound path variable parsed into `T`; parse errors classify as 400.
    pub fn param_as<T>(&self, name: &str) -> Result<T, Failure>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Ok(self.param(name)?.parse::<T>()?)
    }

    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    pub(crate) fn bind(&mut self, route: Arc<Route>, bindings: Bindings) {
        self.route = Some(route);
        self.bindings = bindings;
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    pub fn status(&self) -> StatusCode {
        self.response.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.response.status = status;
        self
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, Failure> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.response.headers.insert(name, value);
        Ok(self)
    }

    pub fn set_content_type(&mut self, content_type: &str) -> Result<&mut Self, Failure> {
        let value = HeaderValue::from_str(content_type)?;
        self.response.headers.insert(CONTENT_TYPE, value);
        Ok(self)
    }

    /// Set the content type unless a handler already chose one.
    pub fn set_default_content_type(&mut self, content_type: &str) -> Result<&mut Self, Failure> {
        if !self.response.headers.contains_key(CONTENT_TYPE) {
            self.set_content_type(content_type)?;
        }
        Ok(self)
    }

    /// Commit the response body.
    pub fn send(&mut self, body: impl Into<Vec<u8>>) -> Result<(), AlreadySent> {
        if self.response.committed {
            return Err(AlreadySent);
        }
        self.response.body = body.into();
        self.response.committed = true;
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.response.committed
    }

    /// Move the response out, leaving a fresh uncommitted one.
    pub fn take_response(&mut self) -> ResponseState {
        std::mem::take(&mut self.response)
    }

    /// Copy of the request side and current response state for a detached task.
    pub(crate) fn fork(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            bindings: self.bindings.clone(),
            route: self.route.clone(),
            response: self.response.clone(),
            extensions: self.extensions.clone(),
            pending: None,
        }
    }

    pub(crate) fn set_pending(&mut self, pending: Pending) {
        self.pending = Some(pending);
    }

    pub(crate) fn take_pending(&mut self) -> Option<Pending> {
        self.pending.take()
    }
}
