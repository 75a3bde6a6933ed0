// crates/selectkit-core/src/error.rs
use thiserror::Error;

/// Errors raised while loading datasets or configuration.
#[derive(Debug, Error)]
pub enum SelectError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "json")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary snapshot error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, SelectError>;

/// Failure reported by a search or entity-by-id collaborator.
///
/// `Clone` because one in-flight fetch may be awaited by several coalesced
/// callers, each of which receives the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("entity {0} not found")]
    NotFound(String),
}

/// Misuse of the cascading selection API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CascadeError {
    #[error("cascade has {len} levels, level {level} does not exist")]
    NoSuchLevel { level: usize, len: usize },

    #[error("{value:?} is not an option of level {level}")]
    UnknownOption { level: usize, value: String },
}
