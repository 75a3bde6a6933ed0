//! selectkit prelude: the types a form host usually needs in scope.

pub use crate::cache::SuggestionCache;
pub use crate::cascade::{AutoFillRule, CascadingSelectionGraph, TargetProvenance};
pub use crate::clock::{Clock, ManualClock, SystemClock, Timestamp};
pub use crate::common::{Candidate, Delivery, EntityId, SearchStatus};
pub use crate::config::{CacheConfig, PickerConfig, Settings, TtlClass};
pub use crate::error::{CascadeError, FetchError, SelectError};
pub use crate::geo::{GeographyIndex, GeographySearch};
pub use crate::picker::Picker;
pub use crate::selection::FieldState;
pub use crate::traits::{CascadeSource, EntityById, SearchEntities};
