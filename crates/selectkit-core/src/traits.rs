// crates/selectkit-core/src/traits.rs

//! Boundary contracts consumed by the core.
//!
//! The network/data client lives outside this crate. Pickers talk to it only
//! through [`SearchEntities`] and [`EntityById`]; cascades read their options
//! and derived values through [`CascadeSource`].
//!
//! Futures are `?Send`: everything runs on one logical thread.

use crate::common::{Candidate, EntityId};
use crate::error::FetchError;
use async_trait::async_trait;

/// Free-text search collaborator (e.g. "find company by name").
#[async_trait(?Send)]
pub trait SearchEntities {
    async fn search_entities(&self, query: &str, limit: usize)
        -> Result<Vec<Candidate>, FetchError>;
}

/// Resolves an externally supplied value into a display label.
#[async_trait(?Send)]
pub trait EntityById {
    async fn get_entity_by_id(&self, id: &EntityId) -> Result<Candidate, FetchError>;
}

/// Static option table behind a cascading selector.
///
/// `parents` holds the selected keys of the levels above the one being asked
/// about, outermost first; `parents.len()` is therefore the level index.
pub trait CascadeSource {
    /// Options for level `parents.len()`. Unknown parents yield no options.
    fn options(&self, parents: &[&str]) -> Vec<Candidate>;

    /// Derived value for a fully selected path (e.g. a city's primary postal
    /// code). `None` or an empty string means nothing can be derived.
    fn derive(&self, path: &[&str]) -> Option<String>;
}

impl<T: CascadeSource + ?Sized> CascadeSource for &T {
    fn options(&self, parents: &[&str]) -> Vec<Candidate> {
        (**self).options(parents)
    }

    fn derive(&self, path: &[&str]) -> Option<String> {
        (**self).derive(path)
    }
}
