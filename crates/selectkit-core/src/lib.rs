// crates/selectkit-core/src/lib.rs

//! Search-to-selection synchronization for entity pickers and cascading
//! geographic selectors.
//!
//! The crate is UI-agnostic. Hosts feed it user events and caller changes,
//! await the fetches it hands back, and render the state it exposes.
//!
//! ```no_run
//! use selectkit_core::prelude::*;
//!
//! let index = GeographyIndex::bundled()?;
//! let mut form = CascadingSelectionGraph::geography(index)
//!     .on_auto_fill(|target, value| println!("{target} = {value}"));
//! form.set_level(0, Some("CO"))?;
//! form.set_level(1, Some("Valle del Cauca"))?;
//! form.set_level(2, Some("Cali"))?; // prints "postal_code = 760001"
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cache;
pub mod cascade;
pub mod clock;
pub mod common;
pub mod config;
pub mod debounce;
pub mod error;
pub mod geo;
pub mod picker;
pub mod prelude;
pub mod selection;
pub mod text; // fold_key & friends
pub mod traits;

// Re-exports
pub use crate::cache::{search_key, CacheStats, SuggestionCache, SuggestionCacheEntry};
pub use crate::cascade::{AutoFillRule, CascadingSelectionGraph, TargetProvenance};
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::common::{
    Candidate, DbStats, Delivery, EntityId, Query, SearchOutcome, SearchStatus,
};
pub use crate::config::{CacheConfig, PickerConfig, Settings, TtlClass};
pub use crate::debounce::DebounceScheduler;
pub use crate::error::{CascadeError, FetchError, Result, SelectError};
pub use crate::geo::{City, Country, GeographyIndex, GeographySearch, State};
pub use crate::picker::{LabelResponse, PendingLabel, PendingSearch, Picker, SearchResponse};
pub use crate::selection::{
    FieldEffect, FieldState, LabelRequest, SelectionField, SelectionSynchronizer,
};
pub use crate::text::{equals_folded, fold_key};
pub use crate::traits::{CascadeSource, EntityById, SearchEntities};
