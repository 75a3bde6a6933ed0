// crates/selectkit-core/src/cascade.rs

//! # Cascading Selection Graph
//!
//! An ordered chain of dependent selectors (country → state → city) where
//! each level's options depend on the levels above it, plus an optional
//! *derived field* filled from the deepest selection (a city's primary
//! postal code).
//!
//! Changing level `i` resets every level below it. The derived field is only
//! written while it is unset or still holds an earlier auto-filled value; a
//! value the user typed is never overwritten.

use crate::common::Candidate;
use crate::error::CascadeError;
use crate::geo::GeographyIndex;
use crate::selection::{FieldEffect, SelectionSynchronizer};
use crate::text::equals_folded;
use crate::traits::CascadeSource;
use serde::Serialize;
use std::fmt;

/// Where the derived field's current content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetProvenance {
    #[default]
    Unset,
    /// Written by the cascade; may be replaced silently.
    AutoFilled,
    /// Typed (or loaded) by the user; never overwritten.
    Manual,
    /// Auto-filled once, but its source selection is gone. Kept as is and no
    /// longer replaced silently.
    Retained,
}

/// Derive the value of `target` from the selection at `source_level`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoFillRule {
    pub source_level: usize,
    pub target: String,
}

type ChangeHandler = Box<dyn FnMut(usize, Option<&str>)>;
type AutoFillHandler = Box<dyn FnMut(&str, &str)>;
type InvalidatedHandler = Box<dyn FnMut(&str)>;

#[derive(Default)]
struct Handlers {
    on_change: Option<ChangeHandler>,
    on_auto_fill: Option<AutoFillHandler>,
    on_auto_fill_invalidated: Option<InvalidatedHandler>,
}

#[derive(Debug)]
struct Level {
    name: String,
    field: SelectionSynchronizer,
}

pub struct CascadingSelectionGraph<S: CascadeSource> {
    source: S,
    levels: Vec<Level>,
    rule: Option<AutoFillRule>,
    target_value: String,
    provenance: TargetProvenance,
    handlers: Handlers,
}

impl<S: CascadeSource> fmt::Debug for CascadingSelectionGraph<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CascadingSelectionGraph")
            .field("levels", &self.levels)
            .field("rule", &self.rule)
            .field("target_value", &self.target_value)
            .field("provenance", &self.provenance)
            .finish()
    }
}

impl<'a> CascadingSelectionGraph<&'a GeographyIndex> {
    /// `country → state → city`, auto-filling `postal_code` from the city.
    pub fn geography(index: &'a GeographyIndex) -> Self {
        CascadingSelectionGraph::new(index, &["country", "state", "city"]).with_auto_fill(AutoFillRule {
            source_level: 2,
            target: "postal_code".to_string(),
        })
    }
}

impl<S: CascadeSource> CascadingSelectionGraph<S> {
    pub fn new(source: S, level_names: &[&str]) -> Self {
        Self {
            source,
            levels: level_names
                .iter()
                .map(|name| Level {
                    name: name.to_string(),
                    field: SelectionSynchronizer::new(),
                })
                .collect(),
            rule: None,
            target_value: String::new(),
            provenance: TargetProvenance::Unset,
            handlers: Handlers::default(),
        }
    }

    pub fn with_auto_fill(mut self, rule: AutoFillRule) -> Self {
        self.rule = Some(rule);
        self
    }

    pub fn on_change(mut self, f: impl FnMut(usize, Option<&str>) + 'static) -> Self {
        self.handlers.on_change = Some(Box::new(f));
        self
    }

    /// Called with `(target, value)`.
    pub fn on_auto_fill(mut self, f: impl FnMut(&str, &str) + 'static) -> Self {
        self.handlers.on_auto_fill = Some(Box::new(f));
        self
    }

    pub fn on_auto_fill_invalidated(mut self, f: impl FnMut(&str) + 'static) -> Self {
        self.handlers.on_auto_fill_invalidated = Some(Box::new(f));
        self
    }

    // -----------------------------------------------------------------------
    // Read side
    // -----------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn check(&self, level: usize) -> Result<(), CascadeError> {
        if level < self.levels.len() {
            Ok(())
        } else {
            Err(CascadeError::NoSuchLevel {
                level,
                len: self.levels.len(),
            })
        }
    }

    pub fn level_name(&self, level: usize) -> Result<&str, CascadeError> {
        self.check(level)?;
        Ok(&self.levels[level].name)
    }

    pub fn field(&self, level: usize) -> Result<&SelectionSynchronizer, CascadeError> {
        self.check(level)?;
        Ok(&self.levels[level].field)
    }

    pub fn value(&self, level: usize) -> Option<&str> {
        self.levels
            .get(level)
            .and_then(|l| l.field.value())
            .map(|id| id.as_str())
    }

    pub fn values(&self) -> Vec<Option<&str>> {
        (0..self.levels.len()).map(|i| self.value(i)).collect()
    }

    pub fn target(&self) -> Option<&str> {
        self.rule.as_ref().map(|r| r.target.as_str())
    }

    pub fn target_value(&self) -> &str {
        &self.target_value
    }

    pub fn provenance(&self) -> TargetProvenance {
        self.provenance
    }

    /// Selected keys of levels `0..level`, or `None` if any is missing.
    fn parents(&self, level: usize) -> Option<Vec<&str>> {
        (0..level).map(|i| self.value(i)).collect()
    }

    /// Options available at `level` given the selections above it.
    pub fn options(&self, level: usize) -> Result<Vec<Candidate>, CascadeError> {
        self.check(level)?;
        Ok(self
            .parents(level)
            .map(|parents| self.source.options(&parents))
            .unwrap_or_default())
    }

    /// Whether picking `key` at `level` would auto-fill the target.
    pub fn auto_fill_hint(&self, level: usize, key: &str) -> bool {
        let Some(rule) = &self.rule else { return false };
        if rule.source_level != level {
            return false;
        }
        let Some(mut path) = self.parents(level) else {
            return false;
        };
        path.push(key);
        self.derived(&path).is_some()
    }

    fn derived(&self, path: &[&str]) -> Option<String> {
        self.source.derive(path).filter(|v| !v.is_empty())
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Selects `value` at `level` (or clears it with `None`), resetting every
    /// level below and applying the auto-fill rule.
    pub fn set_level(&mut self, level: usize, value: Option<&str>) -> Result<(), CascadeError> {
        self.check(level)?;
        if self.value(level) == value {
            return Ok(());
        }

        match value {
            Some(key) => {
                let candidate = self.find_option(level, key)?;
                if self.value(level) == Some(candidate.id.as_str()) {
                    return Ok(());
                }
                let selected = candidate.id.to_string();
                self.levels[level].field.pick(candidate);
                tracing::debug!(level, value = %selected, "cascade level selected");
                self.emit_change(level, Some(&selected));
            }
            None => {
                self.levels[level].field.reset();
                tracing::debug!(level, "cascade level cleared");
                self.emit_change(level, None);
            }
        }
        self.propagate(level);
        Ok(())
    }

    fn find_option(&self, level: usize, key: &str) -> Result<Candidate, CascadeError> {
        self.options(level)?
            .into_iter()
            .find(|c| equals_folded(c.id.as_str(), key) || equals_folded(&c.label, key))
            .ok_or_else(|| CascadeError::UnknownOption {
                level,
                value: key.to_string(),
            })
    }

    /// Routes typing to `level`. Erasing the text clears the level.
    pub fn type_level(&mut self, level: usize, text: &str) -> Result<(), CascadeError> {
        self.check(level)?;
        let effects = self.levels[level].field.type_text(text);
        if effects.contains(&FieldEffect::ValueChanged(None)) {
            self.emit_change(level, None);
            self.propagate(level);
        }
        Ok(())
    }

    pub fn blur_level(&mut self, level: usize) -> Result<(), CascadeError> {
        self.check(level)?;
        self.levels[level].field.blur();
        Ok(())
    }

    /// Records a manual edit of the derived field. Empty text unsets it.
    pub fn edit_target(&mut self, text: &str) {
        self.target_value = text.to_string();
        self.provenance = if text.is_empty() {
            TargetProvenance::Unset
        } else {
            TargetProvenance::Manual
        };
    }

    /// Restores a persisted form without firing callbacks.
    ///
    /// Values are applied top-down; loading stops at the first unknown or
    /// missing value and leaves deeper levels empty.
    pub fn load(&mut self, values: &[Option<&str>], target: Option<&str>) -> Result<(), CascadeError> {
        if let Some(deepest) = values.len().checked_sub(1) {
            self.check(deepest)?;
        }
        for level in &mut self.levels {
            level.field.reset();
        }
        for (level, value) in values.iter().enumerate() {
            let Some(key) = value else { break };
            let Ok(candidate) = self.find_option(level, key) else {
                tracing::warn!(level, value = %key, "unknown value while loading cascade");
                break;
            };
            self.levels[level]
                .field
                .set_external_value(Some(candidate.id), Some(candidate.label));
        }
        match target.filter(|t| !t.is_empty()) {
            Some(t) => {
                self.target_value = t.to_string();
                self.provenance = TargetProvenance::Manual;
            }
            None => {
                self.target_value.clear();
                self.provenance = TargetProvenance::Unset;
            }
        }
        Ok(())
    }

    fn emit_change(&mut self, level: usize, value: Option<&str>) {
        if let Some(f) = self.handlers.on_change.as_mut() {
            f(level, value);
        }
    }

    /// Resets descendants of `level` and re-evaluates the auto-fill rule.
    fn propagate(&mut self, level: usize) {
        for j in level + 1..self.levels.len() {
            if self.levels[j].field.reset() {
                self.emit_change(j, None);
            }
        }

        let Some(rule) = self.rule.clone() else { return };
        if rule.source_level < level {
            return;
        }

        let derived = if rule.source_level == level {
            self.parents(level + 1).and_then(|path| self.derived(&path))
        } else {
            None
        };

        match derived {
            Some(value) => self.auto_fill(&rule.target, value),
            None => self.invalidate_auto_fill(&rule.target),
        }
    }

    fn auto_fill(&mut self, target: &str, value: String) {
        match self.provenance {
            TargetProvenance::Unset | TargetProvenance::AutoFilled => {
                tracing::debug!(target, value = %value, "auto-filling derived field");
                self.target_value = value;
                self.provenance = TargetProvenance::AutoFilled;
                if let Some(f) = self.handlers.on_auto_fill.as_mut() {
                    f(target, &self.target_value);
                }
            }
            TargetProvenance::Manual | TargetProvenance::Retained => {
                tracing::debug!(target, "derived field holds a kept value; not overwriting");
            }
        }
    }

    fn invalidate_auto_fill(&mut self, target: &str) {
        if self.provenance != TargetProvenance::AutoFilled {
            return;
        }
        self.provenance = TargetProvenance::Retained;
        if let Some(f) = self.handlers.on_auto_fill_invalidated.as_mut() {
            f(target);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::tests::fixture;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Change(usize, Option<String>),
        AutoFill(String),
        Invalidated,
    }

    fn recorded(
        index: &GeographyIndex,
    ) -> (CascadingSelectionGraph<&GeographyIndex>, Rc<RefCell<Vec<Event>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));
        let graph = CascadingSelectionGraph::geography(index)
            .on_change(move |level, v| a.borrow_mut().push(Event::Change(level, v.map(String::from))))
            .on_auto_fill(move |_, v| b.borrow_mut().push(Event::AutoFill(v.to_string())))
            .on_auto_fill_invalidated(move |_| c.borrow_mut().push(Event::Invalidated));
        (graph, log)
    }

    #[test]
    fn picking_a_city_auto_fills_its_primary_postal_code_once() {
        let index = fixture();
        let (mut g, log) = recorded(&index);
        g.set_level(0, Some("CO")).unwrap();
        g.set_level(1, Some("Valle del Cauca")).unwrap();
        g.set_level(2, Some("Cali")).unwrap();
        g.set_level(2, Some("Cali")).unwrap();

        let fills: Vec<_> = log.borrow().iter().filter(|e| matches!(e, Event::AutoFill(_))).cloned().collect();
        assert_eq!(fills, vec![Event::AutoFill("760001".into())]);
        assert_eq!(g.target_value(), "760001");
        assert_eq!(g.provenance(), TargetProvenance::AutoFilled);
    }

    #[test]
    fn changing_state_resets_city_and_retains_postal_code() {
        let index = fixture();
        let (mut g, log) = recorded(&index);
        g.set_level(0, Some("CO")).unwrap();
        g.set_level(1, Some("Valle del Cauca")).unwrap();
        g.set_level(2, Some("Cali")).unwrap();
        log.borrow_mut().clear();

        g.set_level(1, Some("Cundinamarca")).unwrap();
        assert_eq!(g.value(2), None);
        assert_eq!(
            *log.borrow(),
            vec![
                Event::Change(1, Some("Cundinamarca".into())),
                Event::Change(2, None),
                Event::Invalidated,
            ]
        );
        assert_eq!(g.provenance(), TargetProvenance::Retained);
        assert_eq!(g.target_value(), "760001");
        let cities: Vec<_> = g.options(2).unwrap().into_iter().map(|c| c.label).collect();
        assert_eq!(cities, vec!["Chía", "Soacha"]);
    }

    #[test]
    fn city_without_postal_codes_never_auto_fills() {
        let index = fixture();
        let (mut g, log) = recorded(&index);
        g.set_level(0, Some("CO")).unwrap();
        g.set_level(1, Some("valle del cauca")).unwrap();

        assert!(g.auto_fill_hint(2, "Cali"));
        assert!(!g.auto_fill_hint(2, "Ghost Town"));
        assert!(!g.auto_fill_hint(1, "Cundinamarca"));

        g.set_level(2, Some("Ghost Town")).unwrap();
        assert!(!log.borrow().iter().any(|e| matches!(e, Event::AutoFill(_))));
        assert_eq!(g.provenance(), TargetProvenance::Unset);
    }

    #[test]
    fn manual_target_is_never_overwritten() {
        let index = fixture();
        let (mut g, log) = recorded(&index);
        g.edit_target("99999");
        g.set_level(0, Some("CO")).unwrap();
        g.set_level(1, Some("Valle del Cauca")).unwrap();
        g.set_level(2, Some("Palmira")).unwrap();
        assert_eq!(g.target_value(), "99999");
        assert!(!log.borrow().iter().any(|e| matches!(e, Event::AutoFill(_))));

        g.edit_target("");
        g.set_level(2, Some("Cali")).unwrap();
        assert_eq!(g.target_value(), "760001");
    }

    #[test]
    fn switching_cities_replaces_an_auto_filled_value() {
        let index = fixture();
        let (mut g, _log) = recorded(&index);
        g.load(&[Some("CO"), Some("Valle del Cauca")], None).unwrap();
        g.set_level(2, Some("Cali")).unwrap();
        g.set_level(2, Some("Palmira")).unwrap();
        assert_eq!(g.target_value(), "763531");
        assert_eq!(g.provenance(), TargetProvenance::AutoFilled);
    }

    #[test]
    fn erasing_a_level_clears_descendants() {
        let index = fixture();
        let (mut g, log) = recorded(&index);
        g.load(&[Some("CO"), Some("Cundinamarca"), Some("Chía")], Some("250001")).unwrap();
        assert!(log.borrow().is_empty(), "load fires no callbacks");
        assert_eq!(g.provenance(), TargetProvenance::Manual);

        g.type_level(0, "Co").unwrap();
        assert_eq!(g.value(0), Some("CO"));
        g.type_level(0, "").unwrap();
        assert_eq!(g.values(), vec![None, None, None]);
        assert_eq!(
            *log.borrow(),
            vec![Event::Change(0, None), Event::Change(1, None), Event::Change(2, None)]
        );
    }

    #[test]
    fn misuse_is_reported() {
        let index = fixture();
        let mut g = CascadingSelectionGraph::geography(&index);
        assert_eq!(
            g.set_level(3, Some("x")),
            Err(CascadeError::NoSuchLevel { level: 3, len: 3 })
        );
        assert!(matches!(
            g.set_level(1, Some("Valle del Cauca")),
            Err(CascadeError::UnknownOption { level: 1, .. })
        ));
        assert!(g.options(1).unwrap().is_empty());
    }

    #[test]
    fn oversized_load_leaves_the_form_untouched() {
        let index = fixture();
        let mut g = CascadingSelectionGraph::geography(&index);
        g.load(&[Some("CO"), Some("Cundinamarca"), Some("Chía")], Some("250001")).unwrap();

        let err = g.load(&[Some("CO"), None, None, Some("extra")], None);
        assert_eq!(err, Err(CascadeError::NoSuchLevel { level: 3, len: 3 }));
        assert_eq!(g.values(), vec![Some("CO"), Some("Cundinamarca"), Some("Chía")]);
        assert_eq!(g.target_value(), "250001");
        assert_eq!(g.provenance(), TargetProvenance::Manual);
    }
}
