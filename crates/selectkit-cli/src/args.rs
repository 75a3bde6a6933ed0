use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for selectkit
#[derive(Debug, Parser)]
#[command(
    name = "selectkit",
    version,
    about = "Inspect geography datasets and drive pickers and cascading selectors"
)]
pub struct CliArgs {
    /// Dataset to load (.json, .json.gz, .bin, .bin.gz). Defaults to the bundled one.
    #[arg(short = 'i', long = "input", global = true)]
    pub input: Option<PathBuf>,

    /// TOML settings file layered over the defaults and under SELECTKIT_* variables
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset (e.g. debug, selectkit_core=trace)
    #[arg(long = "log", global = true, default_value = "warn")]
    pub log: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a summary of the dataset contents
    Stats,

    /// List all countries
    Countries,

    /// List all states for a given country
    States {
        /// ISO2 code or name of the country
        country: String,
    },

    /// List cities of a state, or search cities by substring with --search
    Cities {
        /// ISO2 code or name of the country
        country: Option<String>,
        /// State name or code
        state: Option<String>,
        /// Substring to search across all cities instead (case- and accent-insensitive)
        #[arg(short = 's', long = "search", conflicts_with_all = ["country", "state"])]
        search: Option<String>,
    },

    /// Show the postal codes of a city and the one a form would auto-fill
    Postal {
        country: String,
        state: String,
        city: String,
    },

    /// Run the picker pipeline (min length, cache, ranking) for a query
    Search {
        query: String,
        /// Overrides picker.limit from the settings
        #[arg(short = 'n', long = "limit")]
        limit: Option<usize>,
    },

    /// Walk a country/state/city cascade and print every callback it fires
    Cascade {
        country: String,
        state: String,
        city: String,
        /// Simulate a postal code typed by the user before selecting
        #[arg(long = "postal")]
        postal: Option<String>,
    },

    /// Write a binary snapshot of the loaded dataset (.bin or .bin.gz)
    Snapshot {
        output: PathBuf,
    },
}
