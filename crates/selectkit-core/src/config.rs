// crates/selectkit-core/src/config.rs

//! Configuration types for pickers and the suggestion cache.
//!
//! [`Settings::load`] layers an optional TOML file and `SELECTKIT_*`
//! environment variables on top of the built-in defaults.
//! [`Settings::default`] returns the same defaults without touching the
//! filesystem (useful in tests).

use crate::error::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_CONFIG: &str = r#"
[picker]
placeholder      = "Search..."
min_query_length = 2
debounce_ms      = 300
limit            = 10
ttl_class        = "autocomplete"

[cache]
entity_ttl_secs       = 600
autocomplete_ttl_secs = 120
capacity              = 256
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Which freshness policy a lookup uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtlClass {
    /// By-identifier lookups. Such data changes rarely; kept for minutes.
    Entity,
    /// Free-text suggestions. Query-specific and cheap to refetch.
    Autocomplete,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub picker: PickerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// `[picker]` section: display and behaviour configuration of one picker.
#[derive(Debug, Clone, Deserialize)]
pub struct PickerConfig {
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    /// Queries with fewer folded characters short-circuit to `TooShort`.
    #[serde(default = "default_min_query_length")]
    pub min_query_length: usize,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// TTL class used for this picker's search lookups.
    #[serde(default = "default_ttl_class")]
    pub ttl_class: TtlClass,
}

fn default_placeholder() -> String { "Search...".to_string() }
fn default_min_query_length() -> usize { 2 }
fn default_debounce_ms() -> u64 { 300 }
fn default_limit() -> usize { 10 }
fn default_ttl_class() -> TtlClass { TtlClass::Autocomplete }

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            placeholder: default_placeholder(),
            min_query_length: default_min_query_length(),
            debounce_ms: default_debounce_ms(),
            limit: default_limit(),
            ttl_class: default_ttl_class(),
        }
    }
}

impl PickerConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_entity_ttl_secs")]
    pub entity_ttl_secs: u64,
    #[serde(default = "default_autocomplete_ttl_secs")]
    pub autocomplete_ttl_secs: u64,
    /// Upper bound on stored entries; oldest are evicted past it.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_entity_ttl_secs() -> u64 { 600 }
fn default_autocomplete_ttl_secs() -> u64 { 120 }
fn default_capacity() -> usize { 256 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            entity_ttl_secs: default_entity_ttl_secs(),
            autocomplete_ttl_secs: default_autocomplete_ttl_secs(),
            capacity: default_capacity(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Entity => Duration::from_secs(self.entity_ttl_secs),
            TtlClass::Autocomplete => Duration::from_secs(self.autocomplete_ttl_secs),
        }
    }
}

impl Settings {
    /// Built-in defaults, then `path` (if given and present), then
    /// `SELECTKIT_PICKER__DEBOUNCE_MS`-style environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(false));
        }
        let settings = builder
            .add_source(config::Environment::with_prefix("SELECTKIT").separator("__"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_embedded_toml() {
        let parsed = Settings::from_toml_str("").unwrap();
        let built = Settings::default();
        assert_eq!(parsed.picker.min_query_length, built.picker.min_query_length);
        assert_eq!(parsed.picker.debounce_ms, built.picker.debounce_ms);
        assert_eq!(parsed.picker.ttl_class, TtlClass::Autocomplete);
        assert_eq!(parsed.cache.capacity, built.cache.capacity);
        assert_eq!(parsed.cache.entity_ttl_secs, built.cache.entity_ttl_secs);
    }

    #[test]
    fn overrides_layer_on_defaults() {
        let s = Settings::from_toml_str("[picker]\nmin_query_length = 3\nttl_class = \"entity\"\n")
            .unwrap();
        assert_eq!(s.picker.min_query_length, 3);
        assert_eq!(s.picker.ttl_class, TtlClass::Entity);
        assert_eq!(s.picker.debounce_ms, 300);
    }

    #[test]
    fn ttl_classes_differ() {
        let c = CacheConfig::default();
        assert!(c.ttl(TtlClass::Entity) > c.ttl(TtlClass::Autocomplete));
        assert_eq!(c.ttl(TtlClass::Autocomplete), Duration::from_secs(120));
    }
}
