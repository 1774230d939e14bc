//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::EndpointsConfig;
use crate::error::EndpointError;
use std::path::{Path, PathBuf};

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Default config file: `ENDPOINTS_CONFIG` if set, else
    /// `<platform config dir>/endpoints.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ENDPOINTS_CONFIG") {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        directories::ProjectDirs::from("", "reactive", "reactive-endpoints")
            .map(|dirs| dirs.config_dir().join("endpoints.toml"))
    }

    /// Load configuration from the default file (if present) and environment.
    pub fn load() -> Result<EndpointsConfig, EndpointError> {
        Ok(MergeService::load(Self::default_config_path().as_deref())?)
    }

    /// Load configuration from a specific file, which must exist.
    pub fn load_from_file(path: &Path) -> Result<EndpointsConfig, EndpointError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Create default configuration.
    pub fn default() -> EndpointsConfig {
        EndpointsConfig::default()
    }
}
