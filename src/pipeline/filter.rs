//! Filters as declared on a scope.
//!
//! A filter carries its own kind tag. Before filters wrap the downstream
//! segment; after filters run once the handler has produced its result.

use std::fmt;
use std::sync::Arc;

use crate::pipeline::handler::{After, Around};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Before,
    After,
}

#[derive(Clone)]
pub enum Filter {
    Before(Arc<dyn Around>),
    After(Arc<dyn After>),
}

impl Filter {
    pub fn before(filter: impl Around) -> Self {
        Filter::Before(Arc::new(filter))
    }

    pub fn after(filter: impl After) -> Self {
        Filter::After(Arc::new(filter))
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Filter::Before(_) => FilterKind::Before,
            Filter::After(_) => FilterKind::After,
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter::{:?}", self.kind())
    }
}
