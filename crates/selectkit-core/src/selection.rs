// crates/selectkit-core/src/selection.rs

//! # Selection Synchronizer
//!
//! Reconciles a *controlled value* (owned by the hosting form) with the
//! *display text* a user edits locally. Four sources mutate a field:
//!
//! | source            | method                               |
//! |-------------------|--------------------------------------|
//! | user typing       | [`SelectionSynchronizer::type_text`] |
//! | user picking      | [`SelectionSynchronizer::pick`]      |
//! | caller, out of band | [`SelectionSynchronizer::set_external_value`] |
//! | field blur        | [`SelectionSynchronizer::blur`]      |
//!
//! ```text
//!            typing                    pick
//!  Empty ───────────► Editing ─────────────────► Selected
//!    ▲  ◄── erase ────┘  │ blur                     │ typing
//!    │                   ▼                          │
//!    └──── no label ── Reverting ── label known ──► │
//! ```
//!
//! Asynchronous responses carry the issuance `seq` of the query (or label
//! request) that produced them. Every user intent and every external change
//! bumps the field's sequence, so a response that lost the race is dropped
//! as [`Delivery::Stale`] instead of overwriting newer state.

use crate::clock::Timestamp;
use crate::common::{Candidate, Delivery, EntityId, Query, SearchOutcome, SearchStatus};
use crate::error::FetchError;
use serde::Serialize;

/// The caller-visible part of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionField {
    /// Owned by the caller; mirrored here.
    pub controlled_value: Option<EntityId>,
    /// Owned by the field.
    pub display_text: String,
    pub last_synced_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FieldState {
    #[default]
    Empty,
    /// The user is typing; the text need not match any candidate.
    Editing,
    /// A value is set and the display text is its label.
    Selected,
    /// The display text is being brought back in line with the controlled
    /// value, which is set but whose label is not known yet.
    Reverting,
}

/// A request to resolve the label of a controlled value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRequest {
    pub id: EntityId,
    pub seq: u64,
}

/// Side effects the owner of the field must carry out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEffect {
    /// User intent changed the value; notify `on_value_change`.
    ValueChanged(Option<EntityId>),
    /// Fetch the label for a value that has none yet.
    ResolveLabel(LabelRequest),
}

#[derive(Debug, Default)]
pub struct SelectionSynchronizer {
    field: SelectionField,
    state: FieldState,
    seq: u64,
    suggestions: Vec<Candidate>,
    status: SearchStatus,
    /// External value received while editing, applied on blur.
    deferred_external: Option<Option<EntityId>>,
}

impl SelectionSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A field that starts out selected.
    pub fn with_selection(candidate: Candidate) -> Self {
        let mut sync = Self::new();
        sync.select(candidate);
        sync
    }

    pub fn field(&self) -> &SelectionField {
        &self.field
    }

    pub fn state(&self) -> FieldState {
        self.state
    }

    pub fn value(&self) -> Option<&EntityId> {
        self.field.controlled_value.as_ref()
    }

    pub fn display_text(&self) -> &str {
        &self.field.display_text
    }

    pub fn suggestions(&self) -> &[Candidate] {
        &self.suggestions
    }

    pub fn status(&self) -> &SearchStatus {
        &self.status
    }

    pub fn is_editing(&self) -> bool {
        self.state == FieldState::Editing
    }

    pub fn has_deferred_external(&self) -> bool {
        self.deferred_external.is_some()
    }

    /// Current issuance sequence. Responses tagged with an older one are stale.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    fn bump(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn close_suggestions(&mut self) {
        self.suggestions.clear();
        self.status = SearchStatus::Idle;
    }

    fn select(&mut self, candidate: Candidate) {
        self.field.controlled_value = Some(candidate.id);
        self.field.display_text = candidate.label.clone();
        self.field.last_synced_label = Some(candidate.label);
        self.state = FieldState::Selected;
    }

    fn clear(&mut self) {
        self.field = SelectionField::default();
        self.state = FieldState::Empty;
    }

    // -----------------------------------------------------------------------
    // User intent
    // -----------------------------------------------------------------------

    /// The user changed the text. Erasing everything deselects.
    pub fn type_text(&mut self, text: &str) -> Vec<FieldEffect> {
        self.field.display_text = text.to_string();
        if !text.is_empty() {
            self.state = FieldState::Editing;
            return Vec::new();
        }

        // Outstanding searches now belong to text that no longer exists.
        self.bump();
        self.close_suggestions();
        self.deferred_external = None;
        let had_value = self.field.controlled_value.is_some();
        self.clear();
        if had_value {
            tracing::debug!("text erased; clearing selection");
            vec![FieldEffect::ValueChanged(None)]
        } else {
            Vec::new()
        }
    }

    /// The user chose a suggestion.
    pub fn pick(&mut self, candidate: Candidate) -> Vec<FieldEffect> {
        self.bump();
        self.close_suggestions();
        self.deferred_external = None;
        let changed = self.field.controlled_value.as_ref() != Some(&candidate.id);
        let id = candidate.id.clone();
        self.select(candidate);
        if changed {
            vec![FieldEffect::ValueChanged(Some(id))]
        } else {
            Vec::new()
        }
    }

    /// Clears the selection as a user action (e.g. a clear button).
    pub fn clear_selection(&mut self) -> Vec<FieldEffect> {
        self.type_text("")
    }

    /// The field lost focus.
    ///
    /// While editing, a deferred external value wins; otherwise the text
    /// reverts to the last selected label or is cleared.
    pub fn blur(&mut self) -> Vec<FieldEffect> {
        if self.state != FieldState::Editing {
            return Vec::new();
        }
        self.bump();
        self.close_suggestions();

        if let Some(external) = self.deferred_external.take() {
            self.state = FieldState::Reverting;
            return self.apply_external(external, None);
        }

        self.state = FieldState::Reverting;
        self.settle_revert()
    }

    fn settle_revert(&mut self) -> Vec<FieldEffect> {
        match (&self.field.controlled_value, &self.field.last_synced_label) {
            (Some(_), Some(label)) => {
                self.field.display_text = label.clone();
                self.state = FieldState::Selected;
                Vec::new()
            }
            (Some(id), None) => {
                let request = LabelRequest {
                    id: id.clone(),
                    seq: self.seq,
                };
                self.field.display_text.clear();
                vec![FieldEffect::ResolveLabel(request)]
            }
            (None, _) => {
                self.clear();
                Vec::new()
            }
        }
    }

    // -----------------------------------------------------------------------
    // Caller-driven changes
    // -----------------------------------------------------------------------

    /// The caller supplied a new controlled value out of band.
    ///
    /// Never yields [`FieldEffect::ValueChanged`]: echoing a caller's own
    /// change back to it invites update loops. While the user is typing the
    /// change is deferred until blur.
    pub fn set_external_value(
        &mut self,
        value: Option<EntityId>,
        known_label: Option<String>,
    ) -> Vec<FieldEffect> {
        if self.state == FieldState::Editing {
            tracing::debug!(?value, "deferring external value until blur");
            self.deferred_external = Some(value);
            return Vec::new();
        }
        self.apply_external(value, known_label)
    }

    fn apply_external(&mut self, value: Option<EntityId>, known_label: Option<String>) -> Vec<FieldEffect> {
        let Some(id) = value else {
            self.bump();
            self.close_suggestions();
            self.clear();
            return Vec::new();
        };

        if self.field.controlled_value.as_ref() == Some(&id) && known_label.is_none() {
            // Same value: only the display may need restoring.
            return self.settle_revert();
        }

        self.bump();
        self.close_suggestions();
        match known_label {
            Some(label) => {
                self.select(Candidate::new(id, label));
                Vec::new()
            }
            None => {
                self.field.controlled_value = Some(id.clone());
                self.field.last_synced_label = None;
                self.field.display_text.clear();
                self.state = FieldState::Reverting;
                vec![FieldEffect::ResolveLabel(LabelRequest { id, seq: self.seq })]
            }
        }
    }

    /// Re-issues the label lookup after a failed attempt.
    pub fn retry_label(&mut self) -> Option<LabelRequest> {
        if self.state != FieldState::Reverting {
            return None;
        }
        let id = self.field.controlled_value.clone()?;
        let seq = self.bump();
        self.status = SearchStatus::Idle;
        Some(LabelRequest { id, seq })
    }

    /// Result of an entity-by-id lookup.
    pub fn apply_label(
        &mut self,
        request: &LabelRequest,
        result: Result<Candidate, FetchError>,
    ) -> Delivery {
        let current = request.seq == self.seq
            && self.state == FieldState::Reverting
            && self.field.controlled_value.as_ref() == Some(&request.id);
        if !current {
            tracing::debug!(seq = request.seq, latest = self.seq, "dropping stale label response");
            return Delivery::Stale;
        }
        match result {
            Ok(candidate) => {
                self.field.display_text = candidate.label.clone();
                self.field.last_synced_label = Some(candidate.label);
                self.state = FieldState::Selected;
                self.status = SearchStatus::Idle;
            }
            Err(e) => {
                tracing::warn!(id = %request.id, error = %e, "label lookup failed");
                self.status = SearchStatus::TransportError(e.to_string());
            }
        }
        Delivery::Applied
    }

    // -----------------------------------------------------------------------
    // Search plumbing
    // -----------------------------------------------------------------------

    /// Starts a new query for the current text; supersedes all earlier ones.
    pub fn issue_query(&mut self, raw_text: &str, now: Timestamp) -> Query {
        let seq = self.bump();
        self.status = SearchStatus::Loading;
        Query::new(raw_text, now, seq)
    }

    /// Applies a search response if its query is still the latest one and
    /// the user is still typing.
    pub fn apply_search(&mut self, query: &Query, outcome: SearchOutcome) -> Delivery {
        if query.seq != self.seq || self.state != FieldState::Editing {
            tracing::debug!(
                query = %query.raw_text,
                seq = query.seq,
                latest = self.seq,
                "dropping stale search response"
            );
            return Delivery::Stale;
        }
        self.suggestions = outcome.candidates;
        self.status = outcome.status;
        Delivery::Applied
    }

    /// Makes every outstanding response stale (unmount, field switch).
    pub fn invalidate(&mut self) {
        self.bump();
        if self.status == SearchStatus::Loading {
            self.status = SearchStatus::Idle;
        }
    }

    /// Forces `Empty` regardless of state. Used when an ancestor in a cascade
    /// changes; returns whether a value was dropped.
    pub fn reset(&mut self) -> bool {
        let had_value = self.field.controlled_value.is_some();
        self.bump();
        self.close_suggestions();
        self.deferred_external = None;
        self.clear();
        had_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn none() -> Vec<FieldEffect> {
        Vec::new()
    }

    fn acme() -> Candidate {
        Candidate::new(7u64, "Acme")
    }

    fn globex() -> Candidate {
        Candidate::new(9u64, "Globex")
    }

    fn editing(text: &str) -> SelectionSynchronizer {
        let mut s = SelectionSynchronizer::new();
        s.type_text(text);
        s
    }

    #[test]
    fn typing_from_empty_enters_editing() {
        let mut s = SelectionSynchronizer::new();
        assert_eq!(s.type_text("ac"), none());
        assert_eq!(s.state(), FieldState::Editing);
        assert_eq!(s.display_text(), "ac");
        assert_eq!(s.value(), None);
    }

    #[test]
    fn typing_from_selected_keeps_value_until_erased() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        assert_eq!(s.type_text("Acm"), none());
        assert_eq!(s.state(), FieldState::Editing);
        assert_eq!(s.value(), Some(&EntityId::from(7u64)));
    }

    #[test]
    fn erasing_text_deselects_exactly_once() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Ac");
        assert_eq!(s.type_text(""), vec![FieldEffect::ValueChanged(None)]);
        assert_eq!(s.state(), FieldState::Empty);
        assert_eq!(s.value(), None);
        // Already empty: nothing more to report.
        assert_eq!(s.type_text(""), none());
    }

    #[test]
    fn pick_sets_value_and_label() {
        let mut s = editing("ac");
        assert_eq!(s.pick(acme()), vec![FieldEffect::ValueChanged(Some(7u64.into()))]);
        assert_eq!(s.state(), FieldState::Selected);
        assert_eq!(s.display_text(), "Acme");
        assert_eq!(s.field().last_synced_label.as_deref(), Some("Acme"));
    }

    #[test]
    fn picking_a_different_candidate_replaces_label() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Glo");
        assert_eq!(s.pick(globex()), vec![FieldEffect::ValueChanged(Some(9u64.into()))]);
        assert_eq!(s.display_text(), "Globex");
        assert_eq!(s.value(), Some(&EntityId::from(9u64)));
        assert_eq!(s.field().last_synced_label.as_deref(), Some("Globex"));
    }

    #[test]
    fn picking_the_same_candidate_does_not_notify() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Acm");
        assert_eq!(s.pick(acme()), none());
        assert_eq!(s.display_text(), "Acme");
    }

    #[test]
    fn blur_restores_previous_label() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Acme Incorporated?");
        assert_eq!(s.blur(), none());
        assert_eq!(s.state(), FieldState::Selected);
        assert_eq!(s.display_text(), "Acme");
    }

    #[test]
    fn blur_without_selection_clears_text() {
        let mut s = editing("zzz");
        assert_eq!(s.blur(), none());
        assert_eq!(s.state(), FieldState::Empty);
        assert_eq!(s.display_text(), "");
    }

    #[test]
    fn blur_outside_editing_is_a_no_op() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        let seq = s.seq();
        assert_eq!(s.blur(), none());
        assert_eq!(s.seq(), seq);
    }

    #[test]
    fn external_value_with_label_selects() {
        let mut s = SelectionSynchronizer::new();
        assert_eq!(s.set_external_value(Some(7u64.into()), Some("Acme".into())), none());
        assert_eq!(s.state(), FieldState::Selected);
        assert_eq!(s.display_text(), "Acme");
    }

    #[test]
    fn external_value_without_label_requests_it() {
        let mut s = SelectionSynchronizer::new();
        let effects = s.set_external_value(Some(7u64.into()), None);
        let [FieldEffect::ResolveLabel(request)] = effects.as_slice() else {
            panic!("expected a label request, got {effects:?}");
        };
        assert_eq!(s.state(), FieldState::Reverting);

        assert_eq!(s.apply_label(request, Ok(acme())), Delivery::Applied);
        assert_eq!(s.state(), FieldState::Selected);
        assert_eq!(s.display_text(), "Acme");
    }

    #[test]
    fn label_failure_keeps_reverting_until_retry() {
        let mut s = SelectionSynchronizer::new();
        let effects = s.set_external_value(Some(7u64.into()), None);
        let [FieldEffect::ResolveLabel(request)] = effects.as_slice() else {
            panic!("expected a label request");
        };
        s.apply_label(request, Err(FetchError::Transport("503".into())));
        assert_eq!(s.state(), FieldState::Reverting);
        assert!(matches!(s.status(), SearchStatus::TransportError(_)));

        let retry = s.retry_label().expect("retry allowed while reverting");
        assert_eq!(s.apply_label(request, Ok(acme())), Delivery::Stale);
        assert_eq!(s.apply_label(&retry, Ok(acme())), Delivery::Applied);
        assert_eq!(s.display_text(), "Acme");
    }

    #[test]
    fn external_reset_clears_when_idle() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        assert_eq!(s.set_external_value(None, None), none());
        assert_eq!(s.state(), FieldState::Empty);
        assert_eq!(s.display_text(), "");
    }

    #[test]
    fn external_reset_waits_for_blur_while_editing() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Acme Co");
        s.set_external_value(None, None);
        assert_eq!(s.state(), FieldState::Editing);
        assert_eq!(s.display_text(), "Acme Co");
        assert!(s.has_deferred_external());

        assert_eq!(s.blur(), none());
        assert_eq!(s.state(), FieldState::Empty);
        assert_eq!(s.value(), None);
    }

    #[test]
    fn pick_discards_deferred_external_change() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        s.type_text("Glo");
        s.set_external_value(None, None);
        s.pick(globex());
        assert!(!s.has_deferred_external());
        assert_eq!(s.blur(), none());
        assert_eq!(s.display_text(), "Globex");
    }

    #[test]
    fn late_response_of_superseded_query_is_dropped() {
        let mut s = editing("ac");
        let ac = s.issue_query("ac", Timestamp(0));
        s.type_text("acm");
        let acm = s.issue_query("acm", Timestamp(300));

        let acm_results = SearchOutcome::from_fetch(Ok(vec![acme()]));
        assert_eq!(s.apply_search(&acm, acm_results), Delivery::Applied);
        let ac_results = SearchOutcome::from_fetch(Ok(vec![acme(), globex()]));
        assert_eq!(s.apply_search(&ac, ac_results), Delivery::Stale);

        assert_eq!(s.suggestions(), &[acme()]);
        assert_eq!(s.status(), &SearchStatus::Results);
    }

    #[test]
    fn response_after_erase_or_pick_is_dropped() {
        let mut s = editing("ac");
        let q = s.issue_query("ac", Timestamp(0));
        s.type_text("");
        assert_eq!(s.apply_search(&q, SearchOutcome::from_fetch(Ok(vec![acme()]))), Delivery::Stale);
        assert!(s.suggestions().is_empty());

        let mut s = editing("ac");
        let q = s.issue_query("ac", Timestamp(0));
        s.pick(globex());
        assert_eq!(s.apply_search(&q, SearchOutcome::from_fetch(Ok(vec![acme()]))), Delivery::Stale);
        assert_eq!(s.display_text(), "Globex");
    }

    #[test]
    fn reset_reports_dropped_value() {
        let mut s = SelectionSynchronizer::with_selection(acme());
        assert!(s.reset());
        assert_eq!(s.state(), FieldState::Empty);
        assert!(!s.reset());
    }
}
