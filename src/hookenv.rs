//! Hook Environment
//!
//! The collaborators the endpoint layer depends on: the hook-execution
//! environment, the flag store, and the previous-value store used for change
//! detection. [`HookContext`] bundles them for one hook invocation.

pub mod contract;
pub mod memory;

pub use contract::{ChangeStore, ExitCallback, FlagStore, HookEnvironment};
pub use memory::{MemoryChangeStore, MemoryEnvironment, MemoryFlagStore};

use std::sync::Arc;

/// Collaborators available to one hook invocation.
#[derive(Clone)]
pub struct HookContext {
    pub env: Arc<dyn HookEnvironment>,
    pub flags: Arc<dyn FlagStore>,
    pub changes: Arc<dyn ChangeStore>,
}

impl HookContext {
    pub fn new(
        env: Arc<dyn HookEnvironment>,
        flags: Arc<dyn FlagStore>,
        changes: Arc<dyn ChangeStore>,
    ) -> Self {
        Self {
            env,
            flags,
            changes,
        }
    }
}
