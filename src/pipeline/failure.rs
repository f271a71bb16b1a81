//! The single failure type that flows through a pipeline.
//!
//! # Responsibilities
//! - Carry any error a handler, filter or renderer produced, panics included
//! - Expose the `source()` chain so classification can walk from the most
//!   specific error outward
//! - Provide the built-in request errors the classifier knows about
//!
//! # Design Decisions
//! - Every `std::error::Error + Send + Sync` converts with `?`
//! - `Failure` itself is not an `Error`; otherwise the blanket `From` would
//!   overlap with the reflexive one

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// An error carrying the HTTP status it should produce.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct StatusError {
    status: StatusCode,
    message: String,
}

impl StatusError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A caller supplied a value the handler cannot use.
#[derive(Debug, Clone, Error)]
#[error("invalid argument: {0}")]
pub struct InvalidArgument(pub String);

/// A required value (path variable, header, field) is absent.
#[derive(Debug, Clone, Error)]
#[error("missing value: {name}")]
pub struct MissingValue {
    pub name: String,
}

impl MissingValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The resource addressed by the request does not exist.
#[derive(Debug, Clone, Error)]
#[error("resource not found: {0}")]
pub struct ResourceNotFound(pub String);

/// The response was already committed.
#[derive(Debug, Clone, Error)]
#[error("response already sent")]
pub struct AlreadySent;

/// A handler or filter panicked.
#[derive(Debug, Clone, Error)]
#[error("handler panicked: {0}")]
pub struct Panicked(pub String);

#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);

pub struct Failure {
    inner: BoxError,
}

impl Failure {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            inner: Box::new(error),
        }
    }

    /// A plain message with no type of its own; classifies as 500.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Shorthand for a [`StatusError`].
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(StatusError::new(status, message))
    }

    /// Turn a caught panic payload into a failure.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(Panicked(message))
    }

    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.inner.downcast_ref::<E>()
    }

    pub fn is<E: StdError + 'static>(&self) -> bool {
        self.inner.is::<E>()
    }

    /// The wrapped error followed by each of its sources.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let root: &(dyn StdError + 'static) = &*self.inner;
        std::iter::successors(Some(root), |error: &&(dyn StdError + 'static)| {
            (*error).source()
        })
    }

    pub fn into_inner(self) -> BoxError {
        self.inner
    }
}

impl<E> From<E> for Failure
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.inner, f)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        if f.alternate() {
            for cause in self.chain().skip(1) {
                write!(f, ": {}", cause)?;
            }
        }
        Ok(())
    }
}
