// crates/selectkit-core/src/geo/model.rs
use serde::{Deserialize, Serialize};
use std::ops::Range;

// -----------------------------------------------------------------------------
// RAW INPUT (as it comes from the dataset JSON)
// -----------------------------------------------------------------------------

/// Raw city structure as it comes from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CityRaw {
    pub name: String,
    #[serde(default)]
    pub postal_codes: Vec<String>,
    #[serde(default)]
    pub primary_postal_code: Option<String>,
}

/// Raw state / region structure from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct StateRaw {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub cities: Vec<CityRaw>,
}

/// Raw country structure from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRaw {
    pub iso2: String,
    pub name: String,
    #[serde(default)]
    pub states: Vec<StateRaw>,
}

pub type CountriesRaw = Vec<CountryRaw>;

// -----------------------------------------------------------------------------
// FLAT MODEL
// -----------------------------------------------------------------------------

/// A Country entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Country {
    pub id: u16,
    pub iso2: String,
    pub name: String,
    /// Range of this country's states in the master `states` vector.
    pub states_range: Range<u32>,
}

/// A State/Region entry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct State {
    pub id: u32,
    pub country_id: u16,
    pub name: String,
    pub code: Option<String>, // e.g. "VAC" or "CA"
    /// Range of this state's cities in the master `cities` vector.
    pub cities_range: Range<u32>,
}

/// A City entry. Leaf of the hierarchy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct City {
    pub id: u32,
    pub country_id: u16,
    pub state_id: u32,
    pub name: String,
    pub postal_codes: Vec<String>,
    pub primary_postal_code: Option<String>,
}

impl Country {
    pub fn key(&self) -> &str {
        &self.iso2
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iso2(&self) -> &str {
        &self.iso2
    }
}

impl State {
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        self.code.as_deref().unwrap_or("")
    }
}

impl City {
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn postal_codes(&self) -> &[String] {
        &self.postal_codes
    }

    /// Explicit primary code, else the first listed code, else `""`.
    pub fn primary_postal_code(&self) -> &str {
        self.primary_postal_code
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.postal_codes.first().map(String::as_str))
            .unwrap_or("")
    }

    /// Whether selecting this city can auto-fill a postal code.
    pub fn has_postal_code(&self) -> bool {
        !self.primary_postal_code().is_empty()
    }
}
