//! Error types for the endpoint layer.

use thiserror::Error;

/// Errors raised while building or using endpoint views.
#[derive(Error, Debug)]
pub enum EndpointError {
    /// Keyed lookup found no item with the given key.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Positional lookup past the end of a sequence.
    #[error("Index {index} out of range for sequence of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// Assignment on a read-only data view (remote unit data).
    #[error("Remote unit data cannot be modified (key: {0})")]
    WriteNotPermitted(String),

    /// A handle to the relation's publish data is already held in this hook.
    #[error("Publish data for relation {0} is already borrowed")]
    PublishInUse(String),

    /// Failure reported by a hook environment, flag store or change store.
    #[error("Environment error: {0}")]
    Environment(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for EndpointError {
    fn from(err: config::ConfigError) -> Self {
        EndpointError::ConfigError(err.to_string())
    }
}
