//! Segment-indexed prefix tree.
//!
//! # Responsibilities
//! - Store one value per distinct compiled pattern
//! - Resolve a split request path to a value plus captured variable values
//!
//! # Design Decisions
//! - Keyed by whole segments, no intra-segment compression
//! - Precedence at every node: literal child, then the parametric child, then
//!   the wildcard leaf
//! - No backtracking: once a branch is committed a dead end is a miss
//! - Parameter names live on the route, so `{id}` and `{name}` share a slot

use std::collections::HashMap;

use super::pattern::{Constraint, Segment};

/// Two patterns put different constraints on the same parametric slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintConflict {
    pub existing: String,
    pub incoming: String,
}

fn describe(constraint: &Option<Constraint>) -> String {
    match constraint {
        Some(constraint) => constraint.as_str().to_string(),
        None => "<none>".to_string(),
    }
}

#[derive(Debug)]
struct ParamChild<T> {
    constraint: Option<Constraint>,
    node: Node<T>,
}

#[derive(Debug)]
pub struct Node<T> {
    statics: HashMap<String, Node<T>>,
    param: Option<Box<ParamChild<T>>>,
    wildcard: Option<T>,
    value: Option<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            statics: HashMap::new(),
            param: None,
            wildcard: None,
            value: None,
        }
    }
}

impl<T> Node<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, segments: &[Segment], value: T) -> Result<Option<T>, ConstraintConflict> {
        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.statics.entry(text.clone()).or_default(),
                Segment::Parameter(_) => node.param_child(None)?,
                Segment::Regex { constraint, .. } => node.param_child(Some(constraint.clone()))?,
                Segment::Wildcard(_) => return Ok(node.wildcard.replace(value)),
            };
        }
        Ok(node.value.replace(value))
    }

    fn param_child(&mut self, constraint: Option<Constraint>) -> Result<&mut Node<T>, ConstraintConflict> {
        let child = self.param.get_or_insert_with(|| {
            Box::new(ParamChild {
                constraint: constraint.clone(),
                node: Node::default(),
            })
        });
        if child.constraint != constraint {
            return Err(ConstraintConflict {
                existing: describe(&child.constraint),
                incoming: describe(&constraint),
            });
        }
        Ok(&mut child.node)
    }

    /// The value stored for exactly this pattern shape, if any.
    pub fn get_exact(&self, segments: &[Segment]) -> Option<&T> {
        let mut node = self;
        for segment in segments {
            node = match segment {
                Segment::Literal(text) => node.statics.get(text)?,
                Segment::Parameter(_) | Segment::Regex { .. } => &node.param.as_deref()?.node,
                Segment::Wildcard(_) => return node.wildcard.as_ref(),
            };
        }
        node.value.as_ref()
    }

    /// Resolve request segments; captured values come back in path order.
    pub fn find(&self, segments: &[&str]) -> Option<(&T, Vec<String>)> {
        let mut node = self;
        let mut captured = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            if let Some(child) = node.statics.get(*segment) {
                node = child;
                continue;
            }

            if let Some(param) = node.param.as_deref() {
                if !segment.is_empty() {
                    if let Some(constraint) = &param.constraint {
                        if !constraint.is_match(segment) {
                            return None;
                        }
                    }
                    captured.push((*segment).to_string());
                    node = &param.node;
                    continue;
                }
            }

            let value = node.wildcard.as_ref()?;
            captured.push(segments[index..].join("/"));
            return Some((value, captured));
        }

        match node.value.as_ref() {
            Some(value) => Some((value, captured)),
            // `/` reaches a root catch-all with an empty capture.
            None if segments.is_empty() => {
                let value = node.wildcard.as_ref()?;
                captured.push(String::new());
                Some((value, captured))
            }
            None => None,
        }
    }
}
