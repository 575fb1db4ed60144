//! Path Resolver
//!
//! Turns an untrusted classifier answer into one of the configured
//! destinations. The only way to obtain a [`ResolvedDestination`] is through
//! this module, so nothing the classifier says reaches the filesystem unless
//! it names a known destination.

use std::fmt;

use crate::category::{normalize_key, CategoryTable};

/// A vault-relative path that is either a category table value or the
/// configured default
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedDestination(String);

impl ResolvedDestination {
    #[cfg(test)]
    pub(crate) fn new_unchecked(path: &str) -> Self {
        Self(path.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResolvedDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which stage of resolution produced the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    LastSegment,
    Fallback,
}

/// Raw answer together with what it resolved to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub raw: String,
    pub destination: ResolvedDestination,
    pub matched: MatchKind,
}

impl CategoryTable {
    /// Resolve a raw classifier answer.
    ///
    /// Exact value match first, then the normalized last path segment as a
    /// key, else the table's fallback. Total for any input.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let (destination, matched) = if self.contains_destination(raw) {
            (raw.to_string(), MatchKind::Exact)
        } else if let Some(found) = last_segment(raw).and_then(|seg| self.get(&normalize_key(seg)))
        {
            (found.to_string(), MatchKind::LastSegment)
        } else {
            (self.fallback().to_string(), MatchKind::Fallback)
        };

        Resolution {
            raw: raw.to_string(),
            destination: ResolvedDestination(destination),
            matched,
        }
    }
}

/// Final path segment other than empty or `.`, stripped of quoting the model
/// tends to add
fn last_segment(raw: &str) -> Option<&str> {
    raw.split(['/', '\\'])
        .map(|seg| seg.trim().trim_matches(|c: char| matches!(c, '`' | '"' | '\'')).trim())
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .last()
}
