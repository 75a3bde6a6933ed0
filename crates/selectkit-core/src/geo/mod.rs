// crates/selectkit-core/src/geo/mod.rs

//! # Geography Index
//!
//! Static, read-only `country → state → city → postal codes` table.
//!
//! Storage is flat ("structure of arrays"): one vector per level, each parent
//! holding a `Range` into the child vector. Lookups by key go through hash maps
//! built once at load time, keyed on the folded form of the name (see
//! [`fold_key`]) so `"bogota"` finds `"Bogotá"`. Unknown keys at any level
//! return empty results instead of failing.

mod loader;
pub mod model;
mod search;

pub use model::{City, CityRaw, CountriesRaw, Country, CountryRaw, State, StateRaw};
pub use search::GeographySearch;

use crate::common::{Candidate, DbStats};
use crate::error::{Result, SelectError};
use crate::text::fold_key;
use crate::traits::CascadeSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeographyIndex {
    countries: Vec<Country>,
    states: Vec<State>,
    cities: Vec<City>,
    /// Folded ISO2 code and folded name -> country id.
    country_lookup: HashMap<String, u16>,
    /// (country id, folded state name or code) -> state id.
    state_lookup: HashMap<(u16, String), u32>,
    /// (state id, folded city name) -> city id.
    city_lookup: HashMap<(u32, String), u32>,
}

fn to_u32(n: usize, what: &str) -> Result<u32> {
    u32::try_from(n).map_err(|_| SelectError::InvalidData(format!("too many {what}: {n}")))
}

fn slice<'a, T>(items: &'a [T], range: &Range<u32>) -> &'a [T] {
    &items[range.start as usize..range.end as usize]
}

impl GeographyIndex {
    /// Flattens raw dataset rows and builds the lookup maps.
    ///
    /// When two siblings fold to the same key the first one wins the lookup;
    /// both remain listed.
    pub fn from_raw(raw: CountriesRaw) -> Result<Self> {
        let mut countries = Vec::with_capacity(raw.len());
        let mut states = Vec::new();
        let mut cities = Vec::new();
        let mut country_lookup = HashMap::new();
        let mut state_lookup = HashMap::new();
        let mut city_lookup = HashMap::new();

        for c in raw {
            let country_id = u16::try_from(countries.len()).map_err(|_| {
                SelectError::InvalidData(format!("too many countries: {}", countries.len()))
            })?;
            let states_start = to_u32(states.len(), "states")?;

            for s in c.states {
                let state_id = to_u32(states.len(), "states")?;
                let cities_start = to_u32(cities.len(), "cities")?;

                for city in s.cities {
                    let city_id = to_u32(cities.len(), "cities")?;
                    city_lookup
                        .entry((state_id, fold_key(&city.name)))
                        .or_insert(city_id);
                    cities.push(City {
                        id: city_id,
                        country_id,
                        state_id,
                        name: city.name,
                        postal_codes: city.postal_codes,
                        primary_postal_code: city.primary_postal_code,
                    });
                }

                state_lookup
                    .entry((country_id, fold_key(&s.name)))
                    .or_insert(state_id);
                if let Some(code) = s.code.as_deref().filter(|code| !code.is_empty()) {
                    state_lookup
                        .entry((country_id, fold_key(code)))
                        .or_insert(state_id);
                }
                states.push(State {
                    id: state_id,
                    country_id,
                    name: s.name,
                    code: s.code,
                    cities_range: cities_start..to_u32(cities.len(), "cities")?,
                });
            }

            country_lookup.entry(fold_key(&c.iso2)).or_insert(country_id);
            country_lookup.entry(fold_key(&c.name)).or_insert(country_id);
            countries.push(Country {
                id: country_id,
                iso2: c.iso2,
                name: c.name,
                states_range: states_start..to_u32(states.len(), "states")?,
            });
        }

        Ok(Self {
            countries,
            states,
            cities,
            country_lookup,
            state_lookup,
            city_lookup,
        })
    }

    pub fn stats(&self) -> DbStats {
        DbStats {
            countries: self.countries.len(),
            states: self.states.len(),
            cities: self.cities.len(),
            postal_codes: self.cities.iter().map(|c| c.postal_codes.len()).sum(),
        }
    }

    /// All countries in dataset order.
    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    /// Find a country by ISO2 code or name (case- and accent-insensitive).
    pub fn country(&self, country: &str) -> Option<&Country> {
        self.country_lookup
            .get(&fold_key(country))
            .map(|&id| &self.countries[id as usize])
    }

    pub fn state(&self, country: &str, state: &str) -> Option<&State> {
        let country = self.country(country)?;
        self.state_lookup
            .get(&(country.id, fold_key(state)))
            .map(|&id| &self.states[id as usize])
    }

    pub fn city(&self, country: &str, state: &str, city: &str) -> Option<&City> {
        let state = self.state(country, state)?;
        self.city_lookup
            .get(&(state.id, fold_key(city)))
            .map(|&id| &self.cities[id as usize])
    }

    pub fn states_of(&self, country: &str) -> &[State] {
        match self.country(country) {
            Some(c) => slice(&self.states, &c.states_range),
            None => &[],
        }
    }

    pub fn cities_of(&self, country: &str, state: &str) -> &[City] {
        match self.state(country, state) {
            Some(s) => slice(&self.cities, &s.cities_range),
            None => &[],
        }
    }

    pub fn postal_codes_of(&self, country: &str, state: &str, city: &str) -> &[String] {
        self.city(country, state, city)
            .map(City::postal_codes)
            .unwrap_or(&[])
    }

    /// The city's primary postal code: the explicit primary if set, else the
    /// first listed code, else `""`.
    pub fn primary_postal_code_of(&self, country: &str, state: &str, city: &str) -> &str {
        self.city(country, state, city)
            .map(City::primary_postal_code)
            .unwrap_or("")
    }

    /// Whether the country is known and has at least one state.
    pub fn has_data(&self, country: &str) -> bool {
        !self.states_of(country).is_empty()
    }

    /// Parent state and country of a city.
    pub fn city_context<'a>(&'a self, city: &'a City) -> (&'a City, &'a State, &'a Country) {
        let state = &self.states[city.state_id as usize];
        let country = &self.countries[city.country_id as usize];
        (city, state, country)
    }

    pub fn find_cities_by_substring(&self, substr: &str) -> Vec<(&City, &State, &Country)> {
        let q = fold_key(substr);
        if q.is_empty() {
            return Vec::new();
        }
        self.cities
            .iter()
            .filter(|city| fold_key(&city.name).contains(&q))
            .map(|city| self.city_context(city))
            .collect()
    }
}

impl CascadeSource for GeographyIndex {
    fn options(&self, parents: &[&str]) -> Vec<Candidate> {
        match parents {
            [] => self
                .countries
                .iter()
                .map(|c| Candidate::new(c.key(), c.name()))
                .collect(),
            [country] => self
                .states_of(country)
                .iter()
                .map(|s| Candidate::new(s.key(), s.name()))
                .collect(),
            [country, state] => self
                .cities_of(country, state)
                .iter()
                .map(|c| {
                    let candidate = Candidate::new(c.key(), c.name());
                    match c.primary_postal_code() {
                        "" => candidate,
                        code => candidate.with_secondary(code),
                    }
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn derive(&self, path: &[&str]) -> Option<String> {
        match path {
            [country, state, city] => {
                Some(self.primary_postal_code_of(country, state, city).to_string())
                    .filter(|code| !code.is_empty())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    fn city(name: &str, codes: &[&str]) -> CityRaw {
        CityRaw {
            name: name.into(),
            postal_codes: codes.iter().map(|c| c.to_string()).collect(),
            primary_postal_code: None,
        }
    }

    pub(crate) fn fixture() -> GeographyIndex {
        GeographyIndex::from_raw(vec![
            CountryRaw {
                iso2: "CO".into(),
                name: "Colombia".into(),
                states: vec![
                    StateRaw {
                        name: "Valle del Cauca".into(),
                        code: Some("VAC".into()),
                        cities: vec![
                            city("Cali", &["760001", "760002"]),
                            city("Palmira", &["763531"]),
                            city("Ghost Town", &[]),
                        ],
                    },
                    StateRaw {
                        name: "Cundinamarca".into(),
                        code: Some("CUN".into()),
                        cities: vec![city("Chía", &["250001"]), city("Soacha", &["250051"])],
                    },
                ],
            },
            CountryRaw {
                iso2: "AQ".into(),
                name: "Antarctica".into(),
                states: vec![],
            },
        ])
        .expect("fixture is small")
    }

    #[test]
    fn lookups_walk_the_hierarchy() {
        let idx = fixture();
        let names: Vec<_> = idx.states_of("CO").iter().map(State::name).collect();
        assert_eq!(names, ["Valle del Cauca", "Cundinamarca"]);

        let cities: Vec<_> = idx
            .cities_of("co", "valle del cauca")
            .iter()
            .map(City::name)
            .collect();
        assert_eq!(cities, ["Cali", "Palmira", "Ghost Town"]);

        assert_eq!(idx.postal_codes_of("CO", "Valle del Cauca", "Cali"), ["760001", "760002"]);
        assert_eq!(idx.primary_postal_code_of("CO", "Valle del Cauca", "Cali"), "760001");
    }

    #[test]
    fn keys_match_by_code_name_and_fold() {
        let idx = fixture();
        assert_eq!(idx.country("colombia").map(Country::iso2), Some("CO"));
        assert_eq!(idx.state("CO", "CUN").map(State::name), Some("Cundinamarca"));
        assert!(idx.city("CO", "Cundinamarca", "chia").is_some());
    }

    #[test]
    fn unknown_keys_are_empty_not_errors() {
        let idx = fixture();
        assert!(idx.states_of("XX").is_empty());
        assert!(idx.cities_of("CO", "Atlantis").is_empty());
        assert!(idx.postal_codes_of("CO", "Valle del Cauca", "Nowhere").is_empty());
        assert_eq!(idx.primary_postal_code_of("XX", "Y", "Z"), "");
        assert_eq!(idx.primary_postal_code_of("CO", "Valle del Cauca", "Ghost Town"), "");
    }

    #[test]
    fn has_data_requires_states() {
        let idx = fixture();
        assert!(idx.has_data("CO"));
        assert!(!idx.has_data("AQ"));
        assert!(!idx.has_data("XX"));
    }

    #[test]
    fn stats_count_every_level() {
        let stats = fixture().stats();
        assert_eq!(stats.countries, 2);
        assert_eq!(stats.states, 2);
        assert_eq!(stats.cities, 5);
        assert_eq!(stats.postal_codes, 5);
    }

    #[test]
    fn cascade_source_lists_levels_and_derives_postal_code() {
        let idx = fixture();
        assert_eq!(idx.options(&[]).len(), 2);
        assert_eq!(idx.options(&["CO"]).len(), 2);
        let cali = &idx.options(&["CO", "Valle del Cauca"])[0];
        assert_eq!(cali.secondary_text.as_deref(), Some("760001"));
        assert!(idx.options(&["CO", "Valle del Cauca", "Cali"]).is_empty());

        assert_eq!(
            idx.derive(&["CO", "Valle del Cauca", "Cali"]).as_deref(),
            Some("760001")
        );
        assert_eq!(idx.derive(&["CO", "Valle del Cauca", "Ghost Town"]), None);
        assert_eq!(idx.derive(&["CO", "Valle del Cauca"]), None);
    }
}
