//! Media types for `consumes` / `produces` route metadata.
//!
//! Only the `type/subtype` essence takes part in matching; parameters such as
//! `charset` or `q` are accepted and dropped.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid media type `{0}`")]
pub struct InvalidMediaType(pub String);

/// A parsed `type/subtype` pair, lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    pub fn parse(raw: &str) -> Result<Self, InvalidMediaType> {
        let essence = raw.split(';').next().unwrap_or_default().trim();
        let invalid = || InvalidMediaType(raw.to_string());

        let (kind, subtype) = essence.split_once('/').ok_or_else(invalid)?;
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+*".contains(c))
        };
        if !valid(kind) || !valid(subtype) || (kind == "*" && subtype != "*") {
            return Err(invalid());
        }

        Ok(Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        })
    }

    /// `*/*`
    pub fn any() -> Self {
        Self {
            kind: "*".to_string(),
            subtype: "*".to_string(),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.kind == "*" || self.subtype == "*"
    }

    /// Symmetric match where `*` on either side matches anything.
    pub fn matches(&self, other: &MediaType) -> bool {
        let part = |a: &str, b: &str| a == "*" || b == "*" || a == b;
        part(&self.kind, &other.kind) && part(&self.subtype, &other.subtype)
    }

    /// Parse a comma separated header value, skipping entries that do not parse.
    pub fn parse_list(header: &str) -> Vec<MediaType> {
        header
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| MediaType::parse(entry).ok())
            .collect()
    }
}

impl FromStr for MediaType {
    type Err = InvalidMediaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}
