//! Comparison values carried by fragment relations.
//!
//! A relation's `tree:value` bounds the members of its target fragment,
//! typically with a timestamp. Values are parsed once so that relations can
//! be ordered without re-reading their lexical form.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Parsed `tree:value` literal
///
/// Ordering: timestamps before numbers before text; natural order within a
/// kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ComparisonValue {
    /// xsd:dateTime or RFC 3339 literal; values without a timezone are
    /// taken as UTC
    Timestamp(DateTime<FixedOffset>),
    /// Numeric literal
    Number(f64),
    /// Anything else, compared lexically
    Text(String),
}

impl ComparisonValue {
    /// Parse a literal's lexical form
    #[must_use]
    pub fn parse(lexical: &str) -> Self {
        let trimmed = lexical.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
            return Self::Timestamp(ts);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return Self::Timestamp(naive.and_utc().fixed_offset());
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        Self::Text(lexical.to_string())
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Timestamp(_) => 0,
            Self::Number(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

impl Ord for ComparisonValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Timestamp(a), Self::Timestamp(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for ComparisonValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ComparisonValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComparisonValue {}

impl std::fmt::Display for ComparisonValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}
