//! Configuration
//!
//! Settings for the endpoint layer, merged from built-in defaults, an optional
//! TOML file, and `ENDPOINTS__*` environment variables.

pub mod facade;
pub mod merge;
pub mod sources;

pub use facade::ConfigLoader;

use crate::endpoint::ChangeDetectionPolicy;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub change_detection: ChangeDetectionPolicy,
}
