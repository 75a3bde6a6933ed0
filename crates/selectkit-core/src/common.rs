// crates/selectkit-core/src/common.rs

//! Shared value types used by every layer: identifiers, candidates, queries
//! and the per-field search status.

use crate::clock::Timestamp;
use crate::error::FetchError;
use crate::text::fold_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a selectable entity (company id, ISO code, city key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId(s.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        EntityId(s)
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId(n.to_string())
    }
}

/// One search result item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: EntityId,
    /// Authoritative display text once the candidate is selected.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_text: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<EntityId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            secondary_text: None,
        }
    }

    pub fn with_secondary(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = Some(text.into());
        self
    }
}

/// A search issued by one field.
///
/// `seq` is the field's monotonic issuance counter: a query is superseded by
/// any later query (greater `seq`) of the same field, regardless of when the
/// responses arrive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub raw_text: String,
    pub normalized_key: String,
    pub issued_at: Timestamp,
    pub seq: u64,
}

impl Query {
    pub fn new(raw_text: impl Into<String>, issued_at: Timestamp, seq: u64) -> Self {
        let raw_text = raw_text.into();
        let normalized_key = fold_key(&raw_text);
        Self {
            raw_text,
            normalized_key,
            issued_at,
            seq,
        }
    }

    pub fn supersedes(&self, other: &Query) -> bool {
        self.seq > other.seq
    }
}

/// What the field shows next to its suggestion list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum SearchStatus {
    #[default]
    Idle,
    Loading,
    /// Query below the minimum length; nothing was fetched.
    TooShort,
    Results,
    /// Valid query, empty result set.
    NoResults,
    /// The collaborator could not be reached. Distinct from `NoResults`.
    TransportError(String),
}

impl SearchStatus {
    pub fn is_settled(&self) -> bool {
        matches!(self, SearchStatus::Results | SearchStatus::NoResults)
    }
}

/// Candidates plus the status that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub candidates: Vec<Candidate>,
}

impl SearchOutcome {
    pub fn too_short() -> Self {
        Self {
            status: SearchStatus::TooShort,
            candidates: Vec::new(),
        }
    }

    pub fn from_fetch(result: Result<Vec<Candidate>, FetchError>) -> Self {
        match result {
            Ok(candidates) if candidates.is_empty() => Self {
                status: SearchStatus::NoResults,
                candidates,
            },
            Ok(candidates) => Self {
                status: SearchStatus::Results,
                candidates,
            },
            Err(e) => Self {
                status: SearchStatus::TransportError(e.to_string()),
                candidates: Vec::new(),
            },
        }
    }
}

/// Whether an asynchronous response was applied to its field.
///
/// `Stale` is never shown to users; it exists so callers and tests can tell a
/// discarded response from an applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Applied,
    Stale,
}

/// Simple aggregate statistics for a geography dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbStats {
    pub countries: usize,
    pub states: usize,
    pub cities: usize,
    pub postal_codes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_normalizes_and_orders() {
        let a = Query::new("  AC ", Timestamp(10), 1);
        let b = Query::new("acm", Timestamp(10), 2);
        assert_eq!(a.normalized_key, "ac");
        assert!(b.supersedes(&a));
        assert!(!a.supersedes(&b));
    }

    #[test]
    fn outcome_distinguishes_empty_from_failure() {
        let empty = SearchOutcome::from_fetch(Ok(Vec::new()));
        assert_eq!(empty.status, SearchStatus::NoResults);

        let failed = SearchOutcome::from_fetch(Err(FetchError::Transport("offline".into())));
        assert!(matches!(failed.status, SearchStatus::TransportError(_)));
        assert!(failed.candidates.is_empty());
    }
}
