use reactive_endpoints::hookenv::{MemoryChangeStore, MemoryEnvironment, MemoryFlagStore};
use reactive_endpoints::types::RawData;
use reactive_endpoints::{
    ChangeDetectionPolicy, EndpointError, EndpointFactories, EndpointRegistry, HookContext,
};
use std::sync::Arc;

/// Collaborators that persist across hooks, like a real unit's state.
pub struct Unit {
    pub env: Arc<MemoryEnvironment>,
    pub flags: Arc<MemoryFlagStore>,
    pub changes: Arc<MemoryChangeStore>,
}

impl Unit {
    pub fn new(local_unit: &str) -> Self {
        Self {
            env: Arc::new(MemoryEnvironment::new(local_unit)),
            flags: Arc::new(MemoryFlagStore::new()),
            changes: Arc::new(MemoryChangeStore::new()),
        }
    }

    pub fn ctx(&self) -> HookContext {
        HookContext::new(self.env.clone(), self.flags.clone(), self.changes.clone())
    }

    /// Run one hook with a plain endpoint registered for each name.
    pub fn hook<F>(&self, hook_name: &str, endpoints: &[&str], handler: F) -> Result<(), EndpointError>
    where
        F: FnOnce(&EndpointRegistry) -> Result<(), EndpointError>,
    {
        self.env.set_hook_name(hook_name);
        let mut factories = EndpointFactories::new();
        for name in endpoints {
            factories.register_plain(name);
        }
        reactive_endpoints::run_event(
            &self.ctx(),
            &factories,
            ChangeDetectionPolicy::default(),
            handler,
        )
    }

    pub fn flag(&self, flag: &str) -> bool {
        self.flags.flags().iter().any(|f| f == flag)
    }
}

pub fn data(pairs: &[(&str, &str)]) -> RawData {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
