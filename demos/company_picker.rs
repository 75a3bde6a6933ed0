//! "Find or create a company" picker against a slow, simulated API.
//!
//! Shows debouncing, overlapping queries where the older one answers last,
//! request coalescing between two pickers, and the create-new affordance.
//!
//! Run with `RUST_LOG`-style output disabled; everything is printed.

use async_trait::async_trait;
use selectkit_core::prelude::*;
use selectkit_core::SearchResponse;
use std::rc::Rc;
use std::time::Duration;

struct CompanyApi {
    companies: Vec<Candidate>,
}

#[async_trait(?Send)]
impl SearchEntities for CompanyApi {
    async fn search_entities(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, FetchError> {
        // Shorter queries are slower here, so they tend to answer last.
        let latency = 200u64.saturating_sub(query.len() as u64 * 40);
        tokio::time::sleep(Duration::from_millis(latency)).await;
        println!("  [api] search {query:?} answered after {latency} ms");
        let q = selectkit_core::fold_key(query);
        Ok(self
            .companies
            .iter()
            .filter(|c| selectkit_core::fold_key(&c.label).contains(&q))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[async_trait(?Send)]
impl EntityById for CompanyApi {
    async fn get_entity_by_id(&self, id: &EntityId) -> Result<Candidate, FetchError> {
        self.companies
            .iter()
            .find(|c| &c.id == id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(id.to_string()))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let api = Rc::new(CompanyApi {
        companies: vec![
            Candidate::new(1u64, "Acme").with_secondary("Bogotá"),
            Candidate::new(2u64, "Acme Labs").with_secondary("Cali"),
            Candidate::new(3u64, "Globex").with_secondary("Medellín"),
        ],
    });
    let clock = ManualClock::new();
    let cache = SuggestionCache::new(CacheConfig::default(), Rc::new(clock.clone()));

    let mut picker = Picker::new(api.clone(), cache.clone(), PickerConfig::default())
        .with_lookup(api.clone())
        .on_value_change(|v| println!("  on_value_change({v:?})"))
        .on_create_new(|text| println!("  on_create_new({text:?})"));

    println!("--- Loading an existing value ---");
    if let Some(pending) = picker.set_value(Some(EntityId::from(3u64))) {
        let response = pending.run().await;
        picker.deliver_label(response);
    }
    println!("  display: {:?}\n", picker.display_text());

    println!("--- Overlapping queries ---");
    picker.input("ac");
    clock.advance(picker.config().debounce());
    let first = picker.poll();
    picker.input("acm");
    clock.advance(picker.config().debounce());
    let second = picker.poll();

    if let (Some(first), Some(second)) = (first, second) {
        let (a, b): (SearchResponse, SearchResponse) = tokio::join!(first.run(), second.run());
        // "acm" finished first; apply in arrival order.
        for response in [b, a] {
            let text = response.query.raw_text.clone();
            println!("  deliver {:?} → {:?}", text, picker.deliver(response));
        }
    }
    for c in picker.suggestions() {
        println!("  suggestion: {} ({})", c.label, c.secondary_text.as_deref().unwrap_or(""));
    }
    picker.pick_index(0);
    println!("  display: {:?}\n", picker.display_text());

    println!("--- Two pickers, one fetch ---");
    let mut other = Picker::new(api.clone(), cache.clone(), PickerConfig::default());
    picker.input("glob");
    other.input("Glob");
    clock.advance(Duration::from_millis(300));
    if let (Some(a), Some(b)) = (picker.poll(), other.poll()) {
        let (a, b) = tokio::join!(a.run(), b.run());
        picker.deliver(a);
        other.deliver(b);
    }
    println!("  cache stats: {:?}\n", cache.stats());

    println!("--- Nothing matches: offer to create ---");
    picker.input("Initech");
    picker.settle().await;
    println!("  status: {:?}, offers create-new: {}", picker.status(), picker.offers_create_new());
    picker.create_new();

    println!("\n--- Blur reverts to the selected label ---");
    picker.blur();
    println!("  display: {:?}, state: {:?}", picker.display_text(), picker.state());
}
