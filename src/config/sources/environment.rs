//! Environment variable source: ENDPOINTS_* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `ENDPOINTS__LOGGING__LEVEL=debug` sets `logging.level`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix("ENDPOINTS")
            .separator("__")
            .try_parsing(true),
    ))
}
