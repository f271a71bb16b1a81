//! Failure → HTTP status classification.
//!
//! # Responsibilities
//! - Map any pipeline failure to exactly one status code
//! - Let applications register statuses for their own error types
//!
//! # Order
//! ```text
//! 1. top-level StatusError          → its status
//! 2. registered rules, over the failure and then each source() in turn,
//!    rules in registration order within one error
//! 3. built-in fallbacks             → 400 / 404
//! 4. anything else                  → 500
//! ```
//!
//! # Design Decisions
//! - Read-only after build; shared by the router and detached completions
//! - Re-registering a type replaces its status in place, keeping its position

use std::any::TypeId;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::pipeline::failure::{
    Failure, InvalidArgument, MissingValue, ResourceNotFound, StatusError,
};

type Predicate = Arc<dyn Fn(&(dyn StdError + 'static)) -> bool + Send + Sync>;

#[derive(Clone)]
struct Rule {
    type_id: Option<TypeId>,
    matches: Predicate,
    status: StatusCode,
}

#[derive(Clone, Default)]
pub struct ErrorClassifier {
    rules: Vec<Rule>,
}

impl ErrorClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map every error of type `E` to `status`.
    pub fn register<E>(&mut self, status: StatusCode)
    where
        E: StdError + 'static,
    {
        let type_id = TypeId::of::<E>();
        if let Some(rule) = self
            .rules
            .iter_mut()
            .find(|rule| rule.type_id == Some(type_id))
        {
            rule.status = status;
            return;
        }
        self.rules.push(Rule {
            type_id: Some(type_id),
            matches: Arc::new(|error: &(dyn StdError + 'static)| error.is::<E>()),
            status,
        });
    }

    /// Map every error accepted by `predicate` to `status`.
    pub fn register_rule<P>(&mut self, predicate: P, status: StatusCode)
    where
        P: Fn(&(dyn StdError + 'static)) -> bool + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            type_id: None,
            matches: Arc::new(predicate),
            status,
        });
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn classify(&self, failure: &Failure) -> StatusCode {
        if let Some(error) = failure.downcast_ref::<StatusError>() {
            return error.status();
        }

        for error in failure.chain() {
            if let Some(rule) = self.rules.iter().find(|rule| (rule.matches)(error)) {
                return rule.status;
            }
        }

        failure
            .chain()
            .find_map(builtin)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl fmt::Debug for ErrorClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassifier")
            .field("rules", &self.rules.len())
            .finish()
    }
}

fn builtin(error: &(dyn StdError + 'static)) -> Option<StatusCode> {
    if let Some(status) = error.downcast_ref::<StatusError>() {
        return Some(status.status());
    }
    if error.is::<InvalidArgument>()
        || error.is::<MissingValue>()
        || error.is::<std::num::ParseIntError>()
        || error.is::<std::num::ParseFloatError>()
        || error.is::<std::str::ParseBoolError>()
        || error.is::<std::str::Utf8Error>()
        || error.is::<std::string::FromUtf8Error>()
    {
        return Some(StatusCode::BAD_REQUEST);
    }
    if error.is::<ResourceNotFound>() {
        return Some(StatusCode::NOT_FOUND);
    }
    if let Some(json) = error.downcast_ref::<serde_json::Error>() {
        return (!json.is_io()).then_some(StatusCode::BAD_REQUEST);
    }
    if let Some(io) = error.downcast_ref::<io::Error>() {
        return match io.kind() {
            io::ErrorKind::NotFound => Some(StatusCode::NOT_FOUND),
            io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData => {
                Some(StatusCode::BAD_REQUEST)
            }
            _ => None,
        };
    }
    None
}
