//! Country → state → city form with postal-code auto-fill.
//!
//! Walks the scenarios a form has to get right: auto-fill once, a state change
//! that invalidates the city, a city without postal codes, and a postal code
//! the user typed by hand.

use selectkit_core::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let index = GeographyIndex::bundled()?;
    let mut form = CascadingSelectionGraph::geography(index)
        .on_change(|level, value| println!("  on_change({level}, {value:?})"))
        .on_auto_fill(|target, value| println!("  on_auto_fill({target}, {value:?})"))
        .on_auto_fill_invalidated(|target| println!("  on_auto_fill_invalidated({target})"));

    println!("--- CO / Valle del Cauca / Cali ---");
    form.set_level(0, Some("CO"))?;
    form.set_level(1, Some("Valle del Cauca"))?;
    for city in form.options(2)? {
        let hint = if form.auto_fill_hint(2, city.id.as_str()) { "auto-fills" } else { "-" };
        println!("  option {} [{hint}]", city.label);
    }
    form.set_level(2, Some("Cali"))?;
    form.set_level(2, Some("Cali"))?; // no-op
    println!("  postal_code = {:?} ({:?})\n", form.target_value(), form.provenance());

    println!("--- State changes to Cundinamarca ---");
    form.set_level(1, Some("Cundinamarca"))?;
    println!("  values = {:?}", form.values());
    println!("  postal_code = {:?} ({:?})\n", form.target_value(), form.provenance());

    println!("--- User clears the stale postal code, picks Chía ---");
    form.edit_target("");
    form.set_level(2, Some("chia"))?;
    println!("  postal_code = {:?} ({:?})\n", form.target_value(), form.provenance());

    println!("--- Amazonas / La Pedrera has no postal codes ---");
    form.set_level(1, Some("Amazonas"))?;
    form.edit_target("");
    form.set_level(2, Some("La Pedrera"))?;
    println!("  postal_code = {:?} ({:?})\n", form.target_value(), form.provenance());

    println!("--- Manually typed postal code is kept ---");
    form.edit_target("910009");
    form.set_level(2, Some("Leticia"))?;
    println!("  postal_code = {:?} ({:?})", form.target_value(), form.provenance());

    Ok(())
}
