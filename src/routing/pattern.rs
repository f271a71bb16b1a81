//! Route pattern compilation.
//!
//! # Responsibilities
//! - Parse a pattern string into literal, parameter, regex and wildcard segments
//! - Normalize slashes so patterns and request paths split the same way
//! - Reject malformed patterns before any route reaches the trie
//!
//! # Syntax
//! ```text
//! /users/{id}            parameter, binds one segment
//! /posts/{id:[0-9]+}     constrained parameter, the whole segment must match
//! /files/*               wildcard, binds the rest of the path under "*"
//! /files/*path           named wildcard (also written `{path}*`)
//! ```
//!
//! # Design Decisions
//! - Parameters always span a whole segment (no `/file.{ext}` mixing)
//! - Braces are tracked while splitting, so a regex may contain `/` or `{n}`
//! - A trailing slash is significant: `/a/` compiles to `a` plus an empty literal

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

/// Binding name used by a wildcard declared without a name.
pub const UNNAMED_WILDCARD: &str = "*";

/// Errors raised while compiling a route pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// A wildcard appeared before the final segment.
    #[error("wildcard `{name}` must be the last segment in `{pattern}`")]
    WildcardNotLast { pattern: String, name: String },

    /// The same variable name was declared twice.
    #[error("parameter `{name}` declared twice in `{pattern}`")]
    DuplicateParameter { pattern: String, name: String },

    /// An opening brace without its closing brace, or the reverse.
    #[error("unbalanced braces in `{pattern}`")]
    UnbalancedBraces { pattern: String },

    /// A parameter shares its segment with literal text.
    #[error("parameter must span a whole segment in `{pattern}`, found `{segment}`")]
    PartialSegment { pattern: String, segment: String },

    /// `{}` or `{:regex}`.
    #[error("empty parameter name in `{pattern}`")]
    EmptyName { pattern: String },

    /// The constraint is not a valid regular expression.
    #[error("invalid constraint for `{name}` in `{pattern}`: {source}")]
    InvalidRegex {
        pattern: String,
        name: String,
        #[source]
        source: regex::Error,
    },
}

/// A regular expression anchored to a whole path segment.
#[derive(Debug, Clone)]
pub struct Constraint {
    source: String,
    regex: Regex,
}

impl Constraint {
    fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    /// The expression as written in the pattern.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, segment: &str) -> bool {
        self.regex.is_match(segment)
    }
}

impl PartialEq for Constraint {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Constraint {}

/// One compiled path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Parameter(String),
    Regex { name: String, constraint: Constraint },
    Wildcard(String),
}

impl Segment {
    /// Name of the variable this segment binds, if any.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Segment::Literal(_) => None,
            Segment::Parameter(name) | Segment::Wildcard(name) => Some(name),
            Segment::Regex { name, .. } => Some(name),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Literal(text) => f.write_str(text),
            Segment::Parameter(name) => write!(f, "{{{name}}}"),
            Segment::Regex { name, constraint } => write!(f, "{{{}:{}}}", name, constraint.as_str()),
            Segment::Wildcard(name) if name == UNNAMED_WILDCARD => f.write_str("*"),
            Segment::Wildcard(name) => write!(f, "*{name}"),
        }
    }
}

/// A compiled, immutable route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a pattern string.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let tokens = split_tokens(pattern)?;
        let mut segments = tokens
            .into_iter()
            .filter(|token| !token.is_empty())
            .map(|token| parse_segment(token, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        if !segments.is_empty() && pattern.ends_with('/') {
            segments.push(Segment::Literal(String::new()));
        }

        let mut seen = HashSet::new();
        for (index, segment) in segments.iter().enumerate() {
            if let Segment::Wildcard(name) = segment {
                if index + 1 != segments.len() {
                    return Err(PatternError::WildcardNotLast {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
            }
            if let Some(name) = segment.variable() {
                if !seen.insert(name) {
                    return Err(PatternError::DuplicateParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::variable)
    }

    /// True when the pattern has no variables.
    pub fn is_static(&self) -> bool {
        self.variables().next().is_none()
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

/// Split a request path using the same rules as [`RoutePattern::parse`].
///
/// Empty segments collapse, a trailing slash yields a final empty segment and
/// the root path yields no segments at all.
pub fn split_path(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if !segments.is_empty() && path.ends_with('/') {
        segments.push("");
    }
    segments
}

/// Join a scope prefix with a nested pattern.
///
/// A bare `/` under a non-empty prefix resolves to the prefix itself.
pub fn join(prefix: &str, pattern: &str) -> String {
    if prefix.is_empty() {
        return pattern.to_string();
    }
    if pattern.is_empty() || pattern == "/" {
        return prefix.to_string();
    }
    format!(
        "{}/{}",
        prefix.trim_end_matches('/'),
        pattern.trim_start_matches('/')
    )
}

/// Split on top-level slashes, ignoring slashes nested inside braces.
fn split_tokens(pattern: &str) -> Result<Vec<&str>, PatternError> {
    let unbalanced = || PatternError::UnbalancedBraces {
        pattern: pattern.to_string(),
    };

    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in pattern.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.checked_sub(1).ok_or_else(unbalanced)?,
            '/' if depth == 0 => {
                tokens.push(&pattern[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(unbalanced());
    }
    tokens.push(&pattern[start..]);
    Ok(tokens)
}

fn parse_segment(token: &str, pattern: &str) -> Result<Segment, PatternError> {
    let partial = || PatternError::PartialSegment {
        pattern: pattern.to_string(),
        segment: token.to_string(),
    };

    if token == UNNAMED_WILDCARD {
        return Ok(Segment::Wildcard(UNNAMED_WILDCARD.to_string()));
    }

    if let Some(name) = token.strip_prefix('*') {
        if name.contains(['{', '}', '*']) {
            return Err(partial());
        }
        return Ok(Segment::Wildcard(name.to_string()));
    }

    if token.starts_with('{') {
        let close = closing_brace(token).ok_or_else(partial)?;
        let inner = &token[1..close];
        let wildcard = match &token[close + 1..] {
            "" => false,
            "*" => true,
            _ => return Err(partial()),
        };

        let (name, expression) = match inner.split_once(':') {
            Some((name, expression)) => (name, Some(expression)),
            None => (inner, None),
        };
        if name.is_empty() {
            return Err(PatternError::EmptyName {
                pattern: pattern.to_string(),
            });
        }

        return match (expression, wildcard) {
            (None, false) => Ok(Segment::Parameter(name.to_string())),
            (None, true) => Ok(Segment::Wildcard(name.to_string())),
            (Some(_), true) => Err(partial()),
            (Some(expression), false) => {
                let constraint =
                    Constraint::compile(expression).map_err(|source| PatternError::InvalidRegex {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                        source,
                    })?;
                Ok(Segment::Regex {
                    name: name.to_string(),
                    constraint,
                })
            }
        };
    }

    if token.contains(['{', '}']) {
        return Err(partial());
    }
    Ok(Segment::Literal(token.to_string()))
}

/// Index of the brace closing the token's leading `{`.
fn closing_brace(token: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in token.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pattern: &RoutePattern) -> Vec<&str> {
        pattern.variables().collect()
    }

    #[test]
    fn test_parse_mixed_segments() {
        let pattern = RoutePattern::parse("/users/{id}/posts/{slug:[a-z-]+}/*").unwrap();
        assert_eq!(pattern.segments().len(), 5);
        assert_eq!(pattern.segments()[0], Segment::Literal("users".into()));
        assert_eq!(pattern.segments()[1], Segment::Parameter("id".into()));
        assert!(matches!(&pattern.segments()[3], Segment::Regex { name, .. } if name == "slug"));
        assert_eq!(pattern.segments()[4], Segment::Wildcard("*".into()));
        assert_eq!(names(&pattern), vec!["id", "slug", "*"]);
        assert!(!pattern.is_static());
    }

    #[test]
    fn test_wildcard_spellings() {
        for raw in ["/files/*path", "/files/{path}*"] {
            let pattern = RoutePattern::parse(raw).unwrap();
            assert_eq!(pattern.segments()[1], Segment::Wildcard("path".into()));
        }
    }

    #[test]
    fn test_slash_normalization() {
        assert!(RoutePattern::parse("/").unwrap().segments().is_empty());
        assert!(RoutePattern::parse("").unwrap().segments().is_empty());

        let collapsed = RoutePattern::parse("//a///b").unwrap();
        assert_eq!(collapsed.to_string(), "/a/b");

        let trailing = RoutePattern::parse("/a/").unwrap();
        assert_eq!(
            trailing.segments(),
            &[Segment::Literal("a".into()), Segment::Literal(String::new())]
        );
        assert_eq!(trailing.to_string(), "/a/");

        let relative = RoutePattern::parse("a/{b}").unwrap();
        assert_eq!(relative.to_string(), "/a/{b}");
    }

    #[test]
    fn test_regex_may_contain_braces_and_slashes() {
        let pattern = RoutePattern::parse("/code/{id:[0-9]{3}}").unwrap();
        match &pattern.segments()[1] {
            Segment::Regex { constraint, .. } => {
                assert!(constraint.is_match("123"));
                assert!(!constraint.is_match("1234"));
                assert!(!constraint.is_match("12"));
            }
            other => panic!("unexpected segment {other:?}"),
        }

        let slashed = RoutePattern::parse("/x/{rest:a/b}").unwrap();
        assert_eq!(slashed.segments().len(), 2);
    }

    #[test]
    fn test_constraint_is_anchored() {
        let pattern = RoutePattern::parse("/p/{id:[0-9]+}").unwrap();
        let Segment::Regex { constraint, .. } = &pattern.segments()[1] else {
            panic!("expected a regex segment");
        };
        assert!(constraint.is_match("42"));
        assert!(!constraint.is_match("42x"));
        assert!(!constraint.is_match("x42"));
    }

    #[test]
    fn test_wildcard_must_be_last() {
        let err = RoutePattern::parse("/files/*/meta").unwrap_err();
        assert!(matches!(err, PatternError::WildcardNotLast { .. }));

        let err = RoutePattern::parse("/files/*/").unwrap_err();
        assert!(matches!(err, PatternError::WildcardNotLast { .. }));
    }

    #[test]
    fn test_duplicate_parameter() {
        let err = RoutePattern::parse("/{id}/x/{id:[0-9]+}").unwrap_err();
        assert!(matches!(err, PatternError::DuplicateParameter { ref name, .. } if name == "id"));
    }

    #[test]
    fn test_unbalanced_braces() {
        for raw in ["/a/{id", "/a/id}", "/{a:[0-9]{2}"] {
            let err = RoutePattern::parse(raw).unwrap_err();
            assert!(
                matches!(err, PatternError::UnbalancedBraces { .. }),
                "{raw} produced {err}"
            );
        }
    }

    #[test]
    fn test_partial_and_empty_parameters() {
        assert!(matches!(
            RoutePattern::parse("/file.{ext}").unwrap_err(),
            PatternError::PartialSegment { .. }
        ));
        assert!(matches!(
            RoutePattern::parse("/{a}{b}").unwrap_err(),
            PatternError::PartialSegment { .. }
        ));
        assert!(matches!(
            RoutePattern::parse("/{}").unwrap_err(),
            PatternError::EmptyName { .. }
        ));
        assert!(matches!(
            RoutePattern::parse("/{id:(}").unwrap_err(),
            PatternError::InvalidRegex { .. }
        ));
    }

    #[test]
    fn test_display_round_trips_source_form() {
        let raw = "/p/{id:[0-9]+}/files/*rest";
        assert_eq!(RoutePattern::parse(raw).unwrap().to_string(), raw);
    }

    #[test]
    fn test_split_path() {
        assert!(split_path("/").is_empty());
        assert_eq!(split_path("/a//b"), vec!["a", "b"]);
        assert_eq!(split_path("/a/b/"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "/users"), "/users");
        assert_eq!(join("/api", "/"), "/api");
        assert_eq!(join("/api/", "/users"), "/api/users");
        assert_eq!(join("/api", "users/{id}"), "/api/users/{id}");
    }
}
