//! Basic usage example for selectkit
//!
//! This example demonstrates how to:
//! - Load the bundled geography dataset
//! - Walk country → state → city and read postal codes
//! - Tell "unknown key" (empty result) apart from real errors

use selectkit_core::prelude::*;
use selectkit_core::SelectError;

fn main() -> Result<(), SelectError> {
    println!("=== selectkit Basic Usage Example ===\n");

    println!("Loading bundled geography dataset...");
    let index = GeographyIndex::bundled()?;
    let stats = index.stats();
    println!(
        "✓ {} countries, {} states, {} cities, {} postal codes\n",
        stats.countries, stats.states, stats.cities, stats.postal_codes
    );

    println!("--- Example 1: Countries ---");
    for country in index.countries() {
        let note = if index.has_data(country.iso2()) { "" } else { "  (no states)" };
        println!("{} ({}){note}", country.name(), country.iso2());
    }
    println!();

    println!("--- Example 2: States of Colombia ---");
    for state in index.states_of("CO") {
        println!("- {} [{}]", state.name(), state.code());
    }
    println!();

    println!("--- Example 3: Cities and their auto-fill postal code ---");
    for city in index.cities_of("co", "valle del cauca") {
        match city.primary_postal_code() {
            "" => println!("- {} (no postal code)", city.name()),
            code => println!("- {} → {code} (of {})", city.name(), city.postal_codes().len()),
        }
    }
    println!();

    println!("--- Example 4: Accent-insensitive lookups ---");
    println!(
        "bogota / bogota d.c. / bogota → {:?}",
        index.primary_postal_code_of("CO", "bogota d.c.", "bogota")
    );
    println!();

    println!("--- Example 5: Unknown keys are empty, not errors ---");
    println!("states_of(\"ZZ\") → {} entries", index.states_of("ZZ").len());
    println!(
        "primary_postal_code_of(\"CO\", \"Amazonas\", \"La Pedrera\") → {:?}",
        index.primary_postal_code_of("CO", "Amazonas", "La Pedrera")
    );

    match GeographyIndex::load_from_path("does-not-exist.json") {
        Ok(_) => println!("unexpected: loaded a missing file"),
        Err(e) => println!("load_from_path on a missing file → {e}"),
    }

    println!("\n=== Example completed successfully ===");
    Ok(())
}
