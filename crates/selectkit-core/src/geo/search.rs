// crates/selectkit-core/src/geo/search.rs
use super::{City, Country, GeographyIndex, State};
use crate::common::{Candidate, EntityId};
use crate::error::FetchError;
use crate::text::fold_key;
use crate::traits::{EntityById, SearchEntities};
use async_trait::async_trait;
use std::rc::Rc;

/// Local search collaborator over the cities of a [`GeographyIndex`].
///
/// Candidate ids are `ISO2/State/City` paths, which [`EntityById`] resolves
/// back into a label.
#[derive(Debug, Clone)]
pub struct GeographySearch {
    index: Rc<GeographyIndex>,
}

impl GeographySearch {
    pub fn new(index: GeographyIndex) -> Self {
        Self::from_shared(Rc::new(index))
    }

    pub fn from_shared(index: Rc<GeographyIndex>) -> Self {
        Self { index }
    }

    pub fn index(&self) -> &GeographyIndex {
        &self.index
    }

    pub fn city_id(city: &City, state: &State, country: &Country) -> EntityId {
        EntityId(format!("{}/{}/{}", country.iso2, state.name, city.name))
    }

    fn candidate(city: &City, state: &State, country: &Country) -> Candidate {
        Candidate::new(Self::city_id(city, state, country), city.name.as_str())
            .with_secondary(format!("{}, {}", state.name, country.name))
    }

    /// Ranked city matches: exact name, then prefix, then substring.
    pub fn rank(&self, query: &str, limit: usize) -> Vec<Candidate> {
        let q = fold_key(query);
        let mut hits: Vec<(u8, &City, &State, &Country)> = self
            .index
            .find_cities_by_substring(&q)
            .into_iter()
            .map(|(city, state, country)| {
                let name = fold_key(&city.name);
                let score = if name == q {
                    45
                } else if name.starts_with(&q) {
                    40
                } else {
                    30
                };
                (score, city, state, country)
            })
            .collect();

        hits.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.name.cmp(&b.1.name)));
        hits.into_iter()
            .take(limit)
            .map(|(_, city, state, country)| Self::candidate(city, state, country))
            .collect()
    }
}

#[async_trait(?Send)]
impl SearchEntities for GeographySearch {
    async fn search_entities(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Candidate>, FetchError> {
        Ok(self.rank(query, limit))
    }
}

#[async_trait(?Send)]
impl EntityById for GeographySearch {
    async fn get_entity_by_id(&self, id: &EntityId) -> Result<Candidate, FetchError> {
        let mut parts = id.as_str().splitn(3, '/');
        let (Some(country), Some(state), Some(city)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(FetchError::NotFound(id.to_string()));
        };
        self.index
            .city(country, state, city)
            .map(|city| {
                let (city, state, country) = self.index.city_context(city);
                Self::candidate(city, state, country)
            })
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::fixture;
    use pretty_assertions::assert_eq;

    #[test]
    fn ranks_prefix_before_substring() {
        let search = GeographySearch::new(fixture());
        let labels: Vec<_> = search.rank("a", 10).into_iter().map(|c| c.label).collect();
        // No match starts with "a", so ties fall back to name order.
        assert_eq!(labels, ["Cali", "Chía", "Palmira", "Soacha"].map(String::from));

        let top = search.rank("pal", 10);
        assert_eq!(top[0].label, "Palmira");
        assert_eq!(top[0].secondary_text.as_deref(), Some("Valle del Cauca, Colombia"));
    }

    #[test]
    fn respects_limit() {
        let search = GeographySearch::new(fixture());
        assert_eq!(search.rank("a", 2).len(), 2);
    }

    #[tokio::test]
    async fn resolves_ids_back_to_labels() {
        let search = GeographySearch::new(fixture());
        let id = EntityId::new("CO/Cundinamarca/Chía");
        let candidate = search.get_entity_by_id(&id).await.unwrap();
        assert_eq!(candidate.label, "Chía");

        let missing = search.get_entity_by_id(&EntityId::new("CO/Nowhere")).await;
        assert_eq!(missing, Err(FetchError::NotFound("CO/Nowhere".into())));
    }
}
