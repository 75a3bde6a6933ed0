//! selectkit: command-line front end for `selectkit-core`
//!
//! Inspects geography datasets and drives the same picker and cascade state
//! machines a form would, printing what they do.
//!
//! Usage examples
//! --------------
//!
//! - Show overall stats of the bundled dataset
//!   $ selectkit stats
//!
//! - List states of a country, cities of a state
//!   $ selectkit states CO
//!   $ selectkit cities CO "Valle del Cauca"
//!
//! - Search cities the way a picker does (minimum length, cache, ranking)
//!   $ selectkit search bogota --limit 5
//!
//! - Walk a cascade and watch the postal code auto-fill
//!   $ selectkit cascade CO "Valle del Cauca" Cali
//!   $ selectkit cascade CO "Valle del Cauca" Cali --postal 99999
//!
//! - Convert a JSON dataset into a binary snapshot
//!   $ selectkit --input world.json.gz snapshot world.bin.gz
//!
//! Logging goes to stderr; set `RUST_LOG` or `--log debug` to see the
//! cache and selection decisions.
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use selectkit_core::prelude::*;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

fn load_index(args: &CliArgs) -> anyhow::Result<Rc<GeographyIndex>> {
    if let Some(path) = &args.input {
        let index = GeographyIndex::load_from_path(path)
            .with_context(|| format!("loading dataset {}", path.display()))?;
        return Ok(Rc::new(index));
    }
    #[cfg(feature = "json")]
    {
        Ok(Rc::new(GeographyIndex::bundled()?.clone()))
    }
    #[cfg(not(feature = "json"))]
    {
        anyhow::bail!("no bundled dataset in this build; pass --input <snapshot.bin>")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log)),
        )
        .init();

    let settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    let index = load_index(&args)?;
    tracing::debug!(stats = ?index.stats(), "dataset loaded");

    match args.command {
        Commands::Stats => {
            let stats = index.stats();
            println!("Dataset statistics:");
            println!("  Countries: {}", stats.countries);
            println!("  States/Regions: {}", stats.states);
            println!("  Cities: {}", stats.cities);
            println!("  Postal codes: {}", stats.postal_codes);
        }

        Commands::Countries => {
            for c in index.countries() {
                let marker = if index.has_data(c.iso2()) { "" } else { " (no data)" };
                println!("{} ({}){marker}", c.name(), c.iso2());
            }
        }

        Commands::States { country } => match index.country(&country) {
            Some(c) => {
                println!("States in {}:", c.name());
                for s in index.states_of(&country) {
                    match s.code() {
                        "" => println!("- {}", s.name()),
                        code => println!("- {} [{code}]", s.name()),
                    }
                }
            }
            None => eprintln!("Country {country} not found"),
        },

        Commands::Cities {
            country,
            state,
            search,
        } => {
            if let Some(query) = search {
                let matches = index.find_cities_by_substring(&query);
                if matches.is_empty() {
                    println!("No cities found matching: {query}");
                }
                for (city, state, country) in matches {
                    println!("{} - {}, {}", city.name(), state.name(), country.name());
                }
            } else {
                let (Some(country), Some(state)) = (country, state) else {
                    anyhow::bail!("pass <COUNTRY> <STATE> or --search <TEXT>");
                };
                let cities = index.cities_of(&country, &state);
                if cities.is_empty() {
                    println!("No cities for {country} / {state}");
                }
                for city in cities {
                    match city.primary_postal_code() {
                        "" => println!("- {} (no postal code)", city.name()),
                        code => println!("- {} ({code})", city.name()),
                    }
                }
            }
        }

        Commands::Postal {
            country,
            state,
            city,
        } => {
            let codes = index.postal_codes_of(&country, &state, &city);
            if codes.is_empty() {
                println!("{city}: no postal codes, nothing to auto-fill");
            } else {
                println!("{city}: {}", codes.join(", "));
                println!(
                    "auto-fill: {}",
                    index.primary_postal_code_of(&country, &state, &city)
                );
            }
        }

        Commands::Search { query, limit } => {
            let mut config = settings.picker.clone();
            if let Some(limit) = limit {
                config.limit = limit;
            }
            let cache = SuggestionCache::new(settings.cache.clone(), Rc::new(SystemClock));
            let search = Rc::new(GeographySearch::from_shared(Rc::clone(&index)));
            let mut picker = Picker::new(search, cache, config);

            picker.input(&query);
            picker.settle().await;
            match picker.status() {
                SearchStatus::TooShort => println!(
                    "Query too short (minimum {} characters)",
                    picker.config().min_query_length
                ),
                SearchStatus::NoResults => println!("No cities found matching: {query}"),
                SearchStatus::TransportError(e) => eprintln!("Search failed: {e}"),
                _ => {
                    for c in picker.suggestions() {
                        match &c.secondary_text {
                            Some(detail) => println!("{} - {detail}  [{}]", c.label, c.id),
                            None => println!("{}  [{}]", c.label, c.id),
                        }
                    }
                }
            }
        }

        Commands::Cascade {
            country,
            state,
            city,
            postal,
        } => {
            let mut form = CascadingSelectionGraph::geography(&index)
                .on_change(|level, value| match value {
                    Some(v) => println!("on_change({level}, {v})"),
                    None => println!("on_change({level}, <cleared>)"),
                })
                .on_auto_fill(|target, value| println!("on_auto_fill({target}, {value})"))
                .on_auto_fill_invalidated(|target| println!("on_auto_fill_invalidated({target})"));

            if let Some(postal) = postal {
                println!("user types postal code {postal}");
                form.edit_target(&postal);
            }
            form.set_level(0, Some(&country))?;
            form.set_level(1, Some(&state))?;

            let hints: Vec<String> = form
                .options(2)?
                .into_iter()
                .map(|c| {
                    let mark = if form.auto_fill_hint(2, c.id.as_str()) { "*" } else { " " };
                    format!("{mark}{}", c.label)
                })
                .collect();
            println!("cities (* = auto-fills): {}", hints.join(", "));

            form.set_level(2, Some(&city))?;
            println!(
                "postal_code = {:?} ({:?})",
                form.target_value(),
                form.provenance()
            );
        }

        Commands::Snapshot { output } => {
            index
                .save_binary(&output)
                .with_context(|| format!("writing snapshot {}", output.display()))?;
            println!("Wrote {}", output.display());
        }
    }

    Ok(())
}
