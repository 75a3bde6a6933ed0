// crates/selectkit-core/src/picker.rs

//! Entity picker driver ("find or create a company").
//!
//! A [`Picker`] owns one [`SelectionSynchronizer`] and wires it to a
//! [`DebounceScheduler`], the shared [`SuggestionCache`] and the search /
//! entity-by-id collaborators. It never spawns anything: the host drives it.
//!
//! ```text
//! input("acm") ──► poll() ──► PendingSearch::run().await ──► deliver()
//! set_value(id) ─────────────► PendingLabel::run().await ──► deliver_label()
//! ```
//!
//! Because `run` consumes a detached request, several searches may be in
//! flight at once; [`Picker::deliver`] drops every response whose query was
//! superseded.

use crate::cache::SuggestionCache;
use crate::clock::{Clock, Timestamp};
use crate::common::{Candidate, Delivery, EntityId, Query, SearchOutcome, SearchStatus};
use crate::config::{PickerConfig, TtlClass};
use crate::debounce::DebounceScheduler;
use crate::error::FetchError;
use crate::selection::{FieldEffect, FieldState, LabelRequest, SelectionField, SelectionSynchronizer};
use crate::text::equals_folded;
use crate::traits::{EntityById, SearchEntities};
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

type ValueHandler = Box<dyn FnMut(Option<&EntityId>)>;
type CreateHandler = Box<dyn FnMut(&str)>;
type FocusHandler = Box<dyn FnMut()>;

#[derive(Default)]
struct Handlers {
    on_value_change: Option<ValueHandler>,
    on_create_new: Option<CreateHandler>,
    on_focus: Option<FocusHandler>,
    on_blur: Option<FocusHandler>,
}

/// A search whose debounce window elapsed, detached from the picker.
pub struct PendingSearch {
    query: Query,
    cache: SuggestionCache,
    search: Rc<dyn SearchEntities>,
    limit: usize,
    min_len: usize,
    ttl: Duration,
}

impl fmt::Debug for PendingSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSearch").field("query", &self.query).finish()
    }
}

/// Outcome of a [`PendingSearch`], to hand back to [`Picker::deliver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResponse {
    pub query: Query,
    pub outcome: SearchOutcome,
}

impl PendingSearch {
    pub fn query(&self) -> &Query {
        &self.query
    }

    pub async fn run(self) -> SearchResponse {
        let PendingSearch {
            query,
            cache,
            search,
            limit,
            min_len,
            ttl,
        } = self;
        let text = query.raw_text.trim().to_string();
        let outcome = cache
            .suggest(&query, min_len, limit, ttl, move || async move {
                search.search_entities(&text, limit).await
            })
            .await;
        SearchResponse { query, outcome }
    }
}

/// A label lookup for a controlled value, detached from the picker.
pub struct PendingLabel {
    request: LabelRequest,
    cache: SuggestionCache,
    lookup: Rc<dyn EntityById>,
    ttl: Duration,
}

impl fmt::Debug for PendingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingLabel").field("request", &self.request).finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelResponse {
    pub request: LabelRequest,
    pub result: Result<Candidate, FetchError>,
}

impl PendingLabel {
    pub fn request(&self) -> &LabelRequest {
        &self.request
    }

    /// Resolves the label through the cache under `id:<id>` with the entity TTL.
    pub async fn run(self) -> LabelResponse {
        let PendingLabel {
            request,
            cache,
            lookup,
            ttl,
        } = self;
        let key = format!("id:{}", request.id);
        let id = request.id.clone();
        let result = cache
            .get(&key, ttl, move || async move {
                lookup.get_entity_by_id(&id).await.map(|c| vec![c])
            })
            .await
            .and_then(|found| {
                found
                    .into_iter()
                    .next()
                    .ok_or_else(|| FetchError::NotFound(request.id.to_string()))
            });
        LabelResponse { request, result }
    }
}

/// One entity picker bound to the caller's value.
pub struct Picker {
    sync: SelectionSynchronizer,
    debounce: DebounceScheduler<String>,
    cache: SuggestionCache,
    search: Rc<dyn SearchEntities>,
    lookup: Option<Rc<dyn EntityById>>,
    config: PickerConfig,
    clock: Rc<dyn Clock>,
    handlers: Handlers,
    focused: bool,
    mounted: bool,
}

impl fmt::Debug for Picker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Picker")
            .field("sync", &self.sync)
            .field("debounce", &self.debounce)
            .field("config", &self.config)
            .field("focused", &self.focused)
            .field("mounted", &self.mounted)
            .finish()
    }
}

impl Picker {
    /// The picker reads time from the cache's clock.
    pub fn new(search: Rc<dyn SearchEntities>, cache: SuggestionCache, config: PickerConfig) -> Self {
        let clock = cache.clock();
        Self {
            sync: SelectionSynchronizer::new(),
            debounce: DebounceScheduler::new(),
            cache,
            search,
            lookup: None,
            config,
            clock,
            handlers: Handlers::default(),
            focused: false,
            mounted: true,
        }
    }

    /// Collaborator used to resolve labels of externally supplied values.
    pub fn with_lookup(mut self, lookup: Rc<dyn EntityById>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn on_value_change(mut self, f: impl FnMut(Option<&EntityId>) + 'static) -> Self {
        self.handlers.on_value_change = Some(Box::new(f));
        self
    }

    /// Enables the create-new affordance; `f` receives the current text.
    pub fn on_create_new(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.handlers.on_create_new = Some(Box::new(f));
        self
    }

    pub fn on_focus(mut self, f: impl FnMut() + 'static) -> Self {
        self.handlers.on_focus = Some(Box::new(f));
        self
    }

    pub fn on_blur(mut self, f: impl FnMut() + 'static) -> Self {
        self.handlers.on_blur = Some(Box::new(f));
        self
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn placeholder(&self) -> &str {
        &self.config.placeholder
    }

    pub fn value(&self) -> Option<&EntityId> {
        self.sync.value()
    }

    pub fn display_text(&self) -> &str {
        self.sync.display_text()
    }

    pub fn field(&self) -> &SelectionField {
        self.sync.field()
    }

    pub fn state(&self) -> FieldState {
        self.sync.state()
    }

    pub fn suggestions(&self) -> &[Candidate] {
        self.sync.suggestions()
    }

    pub fn status(&self) -> &SearchStatus {
        self.sync.status()
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// When the host should call [`Picker::poll`] next.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.debounce.deadline()
    }

    // -----------------------------------------------------------------------
    // User intent
    // -----------------------------------------------------------------------

    /// The user edited the text.
    pub fn input(&mut self, text: &str) {
        if !self.mounted {
            return;
        }
        let effects = self.sync.type_text(text);
        if text.is_empty() {
            self.debounce.cancel();
        } else {
            self.debounce
                .schedule(text.to_string(), self.config.debounce(), self.clock.now());
        }
        self.dispatch(effects);
    }

    /// Emits the debounced search once its quiet period has elapsed.
    pub fn poll(&mut self) -> Option<PendingSearch> {
        if !self.mounted {
            return None;
        }
        let text = self.debounce.poll(self.clock.now())?;
        self.issue(text)
    }

    /// Fires the pending search now, ignoring the rest of its quiet period.
    pub fn flush(&mut self) -> Option<PendingSearch> {
        if !self.mounted {
            return None;
        }
        let due = self.debounce.deadline()?;
        let text = self.debounce.poll(due)?;
        self.issue(text)
    }

    fn issue(&mut self, text: String) -> Option<PendingSearch> {
        if !self.sync.is_editing() {
            return None;
        }
        let query = self.sync.issue_query(&text, self.clock.now());
        tracing::debug!(query = %query.raw_text, seq = query.seq, "issuing search");
        Some(PendingSearch {
            query,
            cache: self.cache.clone(),
            search: Rc::clone(&self.search),
            limit: self.config.limit,
            min_len: self.config.min_query_length,
            ttl: self.cache.ttl(self.config.ttl_class),
        })
    }

    /// Applies a search response unless it was superseded.
    pub fn deliver(&mut self, response: SearchResponse) -> Delivery {
        if !self.mounted {
            return Delivery::Stale;
        }
        self.sync.apply_search(&response.query, response.outcome)
    }

    /// Flushes, runs and delivers the pending search in one step.
    pub async fn settle(&mut self) -> Option<Delivery> {
        let pending = self.flush()?;
        let response = pending.run().await;
        Some(self.deliver(response))
    }

    pub fn pick(&mut self, candidate: Candidate) {
        if !self.mounted {
            return;
        }
        self.debounce.cancel();
        let effects = self.sync.pick(candidate);
        self.dispatch(effects);
    }

    /// Picks the `index`-th current suggestion.
    pub fn pick_index(&mut self, index: usize) -> bool {
        match self.sync.suggestions().get(index).cloned() {
            Some(candidate) => {
                self.pick(candidate);
                true
            }
            None => false,
        }
    }

    /// Clears the selection as a user action.
    pub fn clear(&mut self) {
        self.input("");
    }

    pub fn focus(&mut self) {
        if !self.mounted || self.focused {
            return;
        }
        self.focused = true;
        if let Some(f) = self.handlers.on_focus.as_mut() {
            f();
        }
    }

    /// The field lost focus. May ask for a label lookup when a deferred
    /// external value is applied.
    pub fn blur(&mut self) -> Option<PendingLabel> {
        if !self.mounted {
            return None;
        }
        self.debounce.cancel();
        let effects = self.sync.blur();
        if self.focused {
            self.focused = false;
            if let Some(f) = self.handlers.on_blur.as_mut() {
                f();
            }
        }
        self.dispatch(effects)
    }

    // -----------------------------------------------------------------------
    // Caller side
    // -----------------------------------------------------------------------

    /// The form changed the value. Returns the label lookup to run, if any.
    pub fn set_value(&mut self, value: Option<EntityId>) -> Option<PendingLabel> {
        let effects = self.sync.set_external_value(value, None);
        self.dispatch(effects)
    }

    /// Like [`Picker::set_value`] when the label is already known.
    pub fn set_selection(&mut self, candidate: Candidate) {
        let effects = self.sync.set_external_value(Some(candidate.id), Some(candidate.label));
        self.dispatch(effects);
    }

    pub fn deliver_label(&mut self, response: LabelResponse) -> Delivery {
        if !self.mounted {
            return Delivery::Stale;
        }
        self.sync.apply_label(&response.request, response.result)
    }

    pub fn retry_label(&mut self) -> Option<PendingLabel> {
        let request = self.sync.retry_label()?;
        self.label_lookup(request)
    }

    /// Whether the "create new" entry should be shown under the suggestions.
    pub fn offers_create_new(&self) -> bool {
        let text = self.sync.display_text();
        self.handlers.on_create_new.is_some()
            && self.sync.is_editing()
            && self.sync.status().is_settled()
            && !text.trim().is_empty()
            && !self
                .sync
                .suggestions()
                .iter()
                .any(|c| equals_folded(&c.label, text))
    }

    /// Hands the current text to `on_create_new`. No-op unless offered.
    pub fn create_new(&mut self) -> bool {
        if !self.offers_create_new() {
            return false;
        }
        let text = self.sync.display_text().trim().to_string();
        if let Some(f) = self.handlers.on_create_new.as_mut() {
            f(&text);
        }
        true
    }

    /// Cancels the pending debounce and turns every outstanding response into
    /// a no-op. The picker ignores input afterwards.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.debounce.cancel();
        self.sync.invalidate();
        tracing::debug!("picker unmounted");
    }

    fn dispatch(&mut self, effects: Vec<FieldEffect>) -> Option<PendingLabel> {
        let mut pending = None;
        for effect in effects {
            match effect {
                FieldEffect::ValueChanged(value) => {
                    if let Some(f) = self.handlers.on_value_change.as_mut() {
                        f(value.as_ref());
                    }
                }
                FieldEffect::ResolveLabel(request) => pending = self.label_lookup(request),
            }
        }
        pending
    }

    fn label_lookup(&mut self, request: LabelRequest) -> Option<PendingLabel> {
        match &self.lookup {
            Some(lookup) => Some(PendingLabel {
                request,
                cache: self.cache.clone(),
                lookup: Rc::clone(lookup),
                ttl: self.cache.ttl(TtlClass::Entity),
            }),
            None => {
                // Nothing can resolve the label; show the id itself.
                tracing::debug!(id = %request.id, "no entity lookup configured");
                let fallback = Candidate::new(request.id.clone(), request.id.as_str());
                self.sync.apply_label(&request, Ok(fallback));
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::CacheConfig;
    use crate::text::fold_key;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::cell::{Cell, RefCell};

    struct Directory {
        companies: Vec<Candidate>,
        searches: Cell<usize>,
    }

    impl Directory {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                companies: vec![
                    Candidate::new(1u64, "Acme"),
                    Candidate::new(2u64, "Acme Labs"),
                    Candidate::new(3u64, "Globex"),
                ],
                searches: Cell::new(0),
            })
        }
    }

    #[async_trait(?Send)]
    impl SearchEntities for Directory {
        async fn search_entities(&self, query: &str, limit: usize) -> Result<Vec<Candidate>, FetchError> {
            self.searches.set(self.searches.get() + 1);
            let q = fold_key(query);
            Ok(self
                .companies
                .iter()
                .filter(|c| fold_key(&c.label).contains(&q))
                .take(limit)
                .cloned()
                .collect())
        }
    }

    #[async_trait(?Send)]
    impl EntityById for Directory {
        async fn get_entity_by_id(&self, id: &EntityId) -> Result<Candidate, FetchError> {
            self.companies
                .iter()
                .find(|c| &c.id == id)
                .cloned()
                .ok_or_else(|| FetchError::NotFound(id.to_string()))
        }
    }

    fn picker(dir: &Rc<Directory>) -> (Picker, ManualClock) {
        let clock = ManualClock::new();
        let cache = SuggestionCache::new(CacheConfig::default(), Rc::new(clock.clone()));
        let picker = Picker::new(dir.clone(), cache, PickerConfig::default()).with_lookup(dir.clone());
        (picker, clock)
    }

    #[tokio::test]
    async fn debounced_typing_issues_one_search() {
        let dir = Directory::new();
        let (mut p, clock) = picker(&dir);
        for text in ["a", "ac", "acm"] {
            p.input(text);
            clock.advance(Duration::from_millis(100));
            assert!(p.poll().is_none());
        }
        clock.advance(Duration::from_millis(200));
        let pending = p.poll().expect("quiet period elapsed");
        assert_eq!(pending.query().raw_text, "acm");

        let response = pending.run().await;
        assert_eq!(p.deliver(response), Delivery::Applied);
        assert_eq!(dir.searches.get(), 1);
        assert_eq!(p.status(), &SearchStatus::Results);
        assert_eq!(p.suggestions().len(), 2);
    }

    #[tokio::test]
    async fn short_query_reports_too_short() {
        let dir = Directory::new();
        let (mut p, _clock) = picker(&dir);
        p.input("a");
        assert_eq!(p.settle().await, Some(Delivery::Applied));
        assert_eq!(p.status(), &SearchStatus::TooShort);
        assert_eq!(dir.searches.get(), 0);
    }

    #[tokio::test]
    async fn pick_notifies_caller() {
        let dir = Directory::new();
        let (mut p, _clock) = picker(&dir);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        p = p.on_value_change(move |v| sink.borrow_mut().push(v.cloned()));

        p.input("glo");
        p.settle().await;
        assert!(p.pick_index(0));
        assert_eq!(p.display_text(), "Globex");
        assert_eq!(*seen.borrow(), vec![Some(EntityId::from(3u64))]);
    }

    #[tokio::test]
    async fn external_value_resolves_label_through_cache() {
        let dir = Directory::new();
        let (mut p, _clock) = picker(&dir);
        let pending = p.set_value(Some(2u64.into())).expect("label lookup");
        assert_eq!(p.state(), FieldState::Reverting);

        let response = pending.run().await;
        assert_eq!(p.deliver_label(response), Delivery::Applied);
        assert_eq!(p.display_text(), "Acme Labs");
        assert_eq!(p.state(), FieldState::Selected);
    }

    #[tokio::test]
    async fn missing_lookup_falls_back_to_id() {
        let dir = Directory::new();
        let clock = ManualClock::new();
        let cache = SuggestionCache::new(CacheConfig::default(), Rc::new(clock));
        let mut p = Picker::new(dir, cache, PickerConfig::default());
        assert!(p.set_value(Some("ACME-1".into())).is_none());
        assert_eq!(p.display_text(), "ACME-1");
    }

    #[tokio::test]
    async fn create_new_offered_only_without_exact_match() {
        let dir = Directory::new();
        let (p, _clock) = picker(&dir);
        let created = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&created);
        let mut p = p.on_create_new(move |text| sink.borrow_mut().push(text.to_string()));

        p.input("acme");
        p.settle().await;
        assert!(!p.offers_create_new(), "exact match present");

        p.input("Initech ");
        p.settle().await;
        assert_eq!(p.status(), &SearchStatus::NoResults);
        assert!(p.offers_create_new());
        assert!(p.create_new());
        assert_eq!(*created.borrow(), vec!["Initech".to_string()]);
    }

    #[test]
    fn focus_and_blur_callbacks_fire_once() {
        let dir = Directory::new();
        let (p, _clock) = picker(&dir);
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&log), Rc::clone(&log));
        let mut p = p.on_focus(move || a.borrow_mut().push("focus")).on_blur(move || b.borrow_mut().push("blur"));

        p.focus();
        p.focus();
        p.blur();
        p.blur();
        assert_eq!(*log.borrow(), vec!["focus", "blur"]);
    }

    #[test]
    fn unmount_cancels_debounce() {
        let dir = Directory::new();
        let (mut p, clock) = picker(&dir);
        p.input("acm");
        p.unmount();
        clock.advance(Duration::from_secs(1));
        assert!(p.poll().is_none());
        assert_eq!(p.next_deadline(), None);
    }
}
