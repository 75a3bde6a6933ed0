//! selectkit-cli
//! =============
//!
//! Command-line interface for `selectkit-core`.
//!
//! This crate primarily provides a binary (`selectkit`). The library target
//! only carries this overview for rendered documentation.
//!
//! ```text
//! selectkit --help
//! selectkit stats
//! selectkit search cali
//! selectkit cascade CO "Valle del Cauca" Cali
//! ```
//!
//! Settings are read from `--config <file.toml>` and `SELECTKIT_*`
//! environment variables, e.g. `SELECTKIT_PICKER__MIN_QUERY_LENGTH=3`.
#![cfg_attr(docsrs, feature(doc_cfg))]
