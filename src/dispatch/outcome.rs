//! What dispatching one request produced.

use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::dispatch::classify::ErrorClassifier;
use crate::pipeline::{Context, Failure, Pending};

/// Outcome of [`Router::dispatch`](crate::dispatch::Router::dispatch).
///
/// None of these variants has written an error body; mapping them to a
/// response is the boundary layer's job.
#[derive(Debug)]
pub enum Dispatch {
    /// The pipeline finished; the response is in the context.
    Completed,
    /// The route is detached; its outcome arrives later.
    Detached(Detached),
    /// A failure, already classified.
    Failed { status: StatusCode, failure: Failure },
    /// Path matched under other methods only.
    MethodNotAllowed { allowed: Vec<Method> },
    /// Unmatched `*/favicon.ico`.
    Favicon,
    NotFound,
    /// Media negotiation failed (415 or 406).
    Rejected(StatusCode),
}

impl Dispatch {
    /// Status the outcome maps to; `None` when the context decides.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Dispatch::Completed | Dispatch::Detached(_) => None,
            Dispatch::Failed { status, .. } => Some(*status),
            Dispatch::MethodNotAllowed { .. } => Some(StatusCode::METHOD_NOT_ALLOWED),
            Dispatch::Favicon | Dispatch::NotFound => Some(StatusCode::NOT_FOUND),
            Dispatch::Rejected(status) => Some(*status),
        }
    }
}

/// A detached route still running on its own task.
pub struct Detached {
    pending: Pending,
    classifier: Arc<ErrorClassifier>,
}

impl Detached {
    pub(crate) fn new(pending: Pending, classifier: Arc<ErrorClassifier>) -> Self {
        Self {
            pending,
            classifier,
        }
    }

    /// Wait for the task, classifying its failure if it had one.
    pub async fn wait(self) -> Completion {
        let Some(finished) = self.pending.finish().await else {
            let failure = Failure::msg("detached task ended without reporting");
            return Completion::Failed {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                failure,
                context: None,
            };
        };

        match finished.result {
            Ok(_) => Completion::Completed(finished.context),
            Err(failure) => {
                let status = self.classifier.classify(&failure);
                tracing::debug!(status = %status, error = %failure, "Detached route failed");
                Completion::Failed {
                    status,
                    failure,
                    context: Some(finished.context),
                }
            }
        }
    }
}

impl fmt::Debug for Detached {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detached").finish_non_exhaustive()
    }
}

/// Final state of a detached route.
#[derive(Debug)]
pub enum Completion {
    Completed(Context),
    Failed {
        status: StatusCode,
        failure: Failure,
        context: Option<Context>,
    },
}
