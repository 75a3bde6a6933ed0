//! selectkit-wasm: WebAssembly bindings for selectkit-core
//!
//! Lets a browser form host the cascading country → state → city selector
//! (with postal-code auto-fill) and a debouncer, backed by the dataset
//! embedded in `selectkit-core`.
//!
//! What it provides
//! ----------------
//! - Automatic initialization on module load (via `#[wasm_bindgen(start)]`)
//! - Lookups: `countries()`, `states_of(iso2)`, `cities_of(iso2, state)`,
//!   `primary_postal_code_of(...)`, `has_data(iso2)`
//! - `GeoCascade`: the cascading selector, reporting through JS callbacks
//! - `Debouncer`: trailing-edge debounce on `Date.now()`
//!
//! Quick start (browser)
//! ---------------------
//! ```javascript
//! import init, { GeoCascade } from 'selectkit-wasm';
//!
//! await init();
//! const form = new GeoCascade(
//!   (level, value) => console.log('change', level, value),
//!   (target, value) => (postalInput.value = value),
//!   (target) => console.log(target, 'no longer matches the city'),
//! );
//! form.set_level(0, 'CO');
//! form.set_level(1, 'Valle del Cauca');
//! form.options(2).forEach((c) => console.log(c.label, form.auto_fill_hint(2, c.id)));
//! form.set_level(2, 'Cali'); // postalInput.value === '760001'
//! ```
use js_sys::Function;
use selectkit_core::prelude::*;
use selectkit_core::DebounceScheduler;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use std::time::Duration;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    match GeographyIndex::bundled() {
        Ok(index) => {
            let stats = index.stats();
            web_sys::console::log_1(
                &format!("✓ Loaded {} countries, {} cities", stats.countries, stats.cities).into(),
            );
        }
        Err(e) => web_sys::console::error_1(&format!("selectkit: {e}").into()),
    }
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn index() -> Result<&'static GeographyIndex, JsValue> {
    GeographyIndex::bundled().map_err(js_err)
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(JsValue::from)
}

/// `Date.now()` as a [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateClock;

impl Clock for DateClock {
    fn now(&self) -> Timestamp {
        Timestamp(js_sys::Date::now().max(0.0) as u64)
    }
}

/* --------------------------------------------------------------------------
   Geography Lookups
-------------------------------------------------------------------------- */

#[wasm_bindgen]
pub fn get_country_count() -> usize {
    index().map(|i| i.countries().len()).unwrap_or(0)
}

#[wasm_bindgen]
pub fn countries() -> Result<JsValue, JsValue> {
    to_js(&index()?.options(&[]))
}

#[wasm_bindgen]
pub fn states_of(country: &str) -> Result<JsValue, JsValue> {
    to_js(&index()?.options(&[country]))
}

/// Cities with their auto-fill postal code as `secondary_text`.
#[wasm_bindgen]
pub fn cities_of(country: &str, state: &str) -> Result<JsValue, JsValue> {
    to_js(&index()?.options(&[country, state]))
}

#[wasm_bindgen]
pub fn primary_postal_code_of(country: &str, state: &str, city: &str) -> String {
    index()
        .map(|i| i.primary_postal_code_of(country, state, city).to_string())
        .unwrap_or_default()
}

#[wasm_bindgen]
pub fn has_data(country: &str) -> bool {
    index().map(|i| i.has_data(country)).unwrap_or(false)
}

/* --------------------------------------------------------------------------
   Cascading Selector
-------------------------------------------------------------------------- */

fn report(result: Result<JsValue, JsValue>) {
    if let Err(e) = result {
        web_sys::console::error_1(&e);
    }
}

#[derive(Serialize)]
struct CascadeView<'a> {
    values: Vec<Option<&'a str>>,
    postal_code: &'a str,
    provenance: TargetProvenance,
}

#[wasm_bindgen]
pub struct GeoCascade {
    graph: CascadingSelectionGraph<&'static GeographyIndex>,
}

#[wasm_bindgen]
impl GeoCascade {
    /// Callbacks: `on_change(level, value|null)`, `on_auto_fill(target, value)`,
    /// `on_auto_fill_invalidated(target)`. Each may be omitted.
    #[wasm_bindgen(constructor)]
    pub fn new(
        on_change: Option<Function>,
        on_auto_fill: Option<Function>,
        on_auto_fill_invalidated: Option<Function>,
    ) -> Result<GeoCascade, JsValue> {
        let mut graph = CascadingSelectionGraph::geography(index()?);
        if let Some(f) = on_change {
            graph = graph.on_change(move |level, value| {
                let value = value.map(JsValue::from_str).unwrap_or(JsValue::NULL);
                report(f.call2(&JsValue::NULL, &JsValue::from(level as u32), &value));
            });
        }
        if let Some(f) = on_auto_fill {
            graph = graph.on_auto_fill(move |target, value| {
                report(f.call2(&JsValue::NULL, &target.into(), &value.into()));
            });
        }
        if let Some(f) = on_auto_fill_invalidated {
            graph = graph.on_auto_fill_invalidated(move |target| {
                report(f.call1(&JsValue::NULL, &target.into()));
            });
        }
        Ok(GeoCascade { graph })
    }

    /// Selects `value` at `level`; `null` clears the level.
    pub fn set_level(&mut self, level: usize, value: Option<String>) -> Result<(), JsValue> {
        self.graph.set_level(level, value.as_deref()).map_err(js_err)
    }

    pub fn type_level(&mut self, level: usize, text: &str) -> Result<(), JsValue> {
        self.graph.type_level(level, text).map_err(js_err)
    }

    pub fn blur_level(&mut self, level: usize) -> Result<(), JsValue> {
        self.graph.blur_level(level).map_err(js_err)
    }

    /// The user typed into the postal code field.
    pub fn edit_postal_code(&mut self, text: &str) {
        self.graph.edit_target(text);
    }

    pub fn options(&self, level: usize) -> Result<JsValue, JsValue> {
        to_js(&self.graph.options(level).map_err(js_err)?)
    }

    pub fn auto_fill_hint(&self, level: usize, key: &str) -> bool {
        self.graph.auto_fill_hint(level, key)
    }

    pub fn value(&self, level: usize) -> Option<String> {
        self.graph.value(level).map(str::to_string)
    }

    pub fn postal_code(&self) -> String {
        self.graph.target_value().to_string()
    }

    /// `{ values, postal_code, provenance }`
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&CascadeView {
            values: self.graph.values(),
            postal_code: self.graph.target_value(),
            provenance: self.graph.provenance(),
        })
    }
}

/* --------------------------------------------------------------------------
   Debouncer
-------------------------------------------------------------------------- */

/// Trailing-edge debounce for a text input. Call `poll()` from a timer set
/// to `deadline()`.
#[wasm_bindgen]
#[derive(Default)]
pub struct Debouncer {
    inner: DebounceScheduler<String>,
}

#[wasm_bindgen]
impl Debouncer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Debouncer {
        Debouncer::default()
    }

    pub fn schedule(&mut self, value: String, delay_ms: u32) {
        self.inner
            .schedule(value, Duration::from_millis(u64::from(delay_ms)), DateClock.now());
    }

    pub fn poll(&mut self) -> Option<String> {
        self.inner.poll(DateClock.now())
    }

    pub fn cancel(&mut self) -> bool {
        self.inner.cancel()
    }

    /// Milliseconds since the epoch at which the pending value is due.
    pub fn deadline(&self) -> Option<f64> {
        self.inner.deadline().map(|t| t.as_millis() as f64)
    }
}
