//! Registration errors.
//!
//! Every problem found while declaring routes becomes a [`RouteError`]. The
//! builder keeps going after the first one so that [`BuildError`] can report
//! the whole list at startup.

use std::fmt;

use thiserror::Error;

use super::media::InvalidMediaType;
use super::pattern::PatternError;
use super::registry::RouteMethod;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{method} {pattern}: {source}")]
    Pattern {
        method: RouteMethod,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("{method} {pattern}: route already registered")]
    Duplicate { method: RouteMethod, pattern: String },

    #[error("{method} {pattern}: constraint `{incoming}` conflicts with `{existing}` at the same position")]
    ConflictingConstraint {
        method: RouteMethod,
        pattern: String,
        existing: String,
        incoming: String,
    },

    #[error("{pattern}: {source}")]
    InvalidMediaType {
        pattern: String,
        #[source]
        source: InvalidMediaType,
    },

    #[error("{depth} scope(s) still open at build time")]
    UnclosedScope { depth: usize },

    #[error("close_scope called without a matching open_scope")]
    ScopeUnderflow,
}

/// All errors collected while building a router.
#[derive(Debug)]
pub struct BuildError {
    errors: Vec<RouteError>,
}

impl BuildError {
    pub(crate) fn new(errors: Vec<RouteError>) -> Self {
        Self { errors }
    }

    pub fn errors(&self) -> &[RouteError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<RouteError> {
        self.errors
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Router build failed: ")?;
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for BuildError {}
