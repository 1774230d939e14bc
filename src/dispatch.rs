//! Hook Dispatch
//!
//! Runs one hook against the endpoint layer: builds the registry, hands it to
//! the hook body, then either runs the registered exit callbacks (publishing
//! modified relation data) or discards them if anything failed.

use crate::config::EndpointsConfig;
use crate::endpoint::ChangeDetectionPolicy;
use crate::error::EndpointError;
use crate::hookenv::HookContext;
use crate::registry::{EndpointFactories, EndpointRegistry};
use tracing::{info, warn};

/// Run a hook body with a freshly built [`EndpointRegistry`].
///
/// Publish data is flushed only when both the registry build and `handler`
/// succeed. On failure no exit callback runs and buffered writes are dropped
/// with the registry.
pub fn run_event<F, E>(
    ctx: &HookContext,
    factories: &EndpointFactories,
    policy: ChangeDetectionPolicy,
    handler: F,
) -> Result<(), E>
where
    F: FnOnce(&EndpointRegistry) -> Result<(), E>,
    E: From<EndpointError> + std::fmt::Display,
{
    let hook_name = ctx.env.hook_name();
    let registry = match EndpointRegistry::build(ctx, factories, policy) {
        Ok(registry) => registry,
        Err(err) => {
            warn!(hook = %hook_name, error = %err, "Endpoint setup failed; discarding exit callbacks");
            ctx.env.discard_atexit();
            return Err(err.into());
        }
    };

    match handler(&registry) {
        Ok(()) => {
            ctx.env.run_atexit()?;
            info!(hook = %hook_name, "Hook completed");
            Ok(())
        }
        Err(err) => {
            warn!(hook = %hook_name, error = %err, "Hook failed; discarding exit callbacks");
            ctx.env.discard_atexit();
            Err(err)
        }
    }
}

/// [`run_event`] with the change-detection policy taken from `config`.
///
/// Logging is not touched here; install it with
/// [`init_logging`](crate::logging::init_logging) before the first hook.
pub fn run_event_with_config<F, E>(
    ctx: &HookContext,
    factories: &EndpointFactories,
    config: &EndpointsConfig,
    handler: F,
) -> Result<(), E>
where
    F: FnOnce(&EndpointRegistry) -> Result<(), E>,
    E: From<EndpointError> + std::fmt::Display,
{
    run_event(ctx, factories, config.change_detection, handler)
}
