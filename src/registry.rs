//! Endpoint registry and endpoint constructors.

use crate::endpoint::flags::endpoint_name_from_flag;
use crate::endpoint::{ChangeDetectionPolicy, Endpoint};
use crate::error::EndpointError;
use crate::hookenv::HookContext;
use crate::types::{normalize_relation_id, RelationId};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info};

/// A concrete endpoint type built around an [`Endpoint`].
///
/// Interface layers wrap `Endpoint` in their own type to add the methods
/// and flags that make up their public API.
pub trait InterfaceEndpoint: Any + Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    fn as_any(&self) -> &dyn Any;
}

impl InterfaceEndpoint for Endpoint {
    fn endpoint(&self) -> &Endpoint {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builds the concrete endpoint type from a base [`Endpoint`].
pub type EndpointConstructor = Arc<dyn Fn(Endpoint) -> Arc<dyn InterfaceEndpoint> + Send + Sync>;

/// Endpoint name -> constructor of the endpoint type serving it.
///
/// Relation types without a registered constructor are not managed.
#[derive(Clone, Default)]
pub struct EndpointFactories {
    constructors: HashMap<String, EndpointConstructor>,
}

impl EndpointFactories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor for an endpoint name, replacing any previous one.
    pub fn register<F, T>(&mut self, endpoint_name: &str, constructor: F)
    where
        F: Fn(Endpoint) -> T + Send + Sync + 'static,
        T: InterfaceEndpoint,
    {
        let boxed: EndpointConstructor = Arc::new(move |endpoint: Endpoint| {
            Arc::new(constructor(endpoint)) as Arc<dyn InterfaceEndpoint>
        });
        self.constructors.insert(endpoint_name.to_string(), boxed);
    }

    /// Serve an endpoint name with the base [`Endpoint`] type.
    pub fn register_plain(&mut self, endpoint_name: &str) {
        self.register(endpoint_name, |endpoint| endpoint);
    }

    pub fn get(&self, endpoint_name: &str) -> Option<&EndpointConstructor> {
        self.constructors.get(endpoint_name)
    }

    pub fn contains(&self, endpoint_name: &str) -> bool {
        self.constructors.contains_key(endpoint_name)
    }
}

/// Endpoints of the current hook, keyed by endpoint name.
///
/// Built once per hook by [`EndpointRegistry::build`] and passed by reference
/// to whatever needs endpoint lookups.
#[derive(Default)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Arc<dyn InterfaceEndpoint>>,
}

impl EndpointRegistry {
    /// Create endpoints for every relation type with a registered constructor.
    ///
    /// Relation types and relation ids are visited in ascending order. Each
    /// endpoint's automatic flags are updated and every relation's publish
    /// data is registered to be flushed when the hook succeeds.
    pub fn build(
        ctx: &HookContext,
        factories: &EndpointFactories,
        policy: ChangeDetectionPolicy,
    ) -> Result<Self, EndpointError> {
        let mut registry = Self::default();
        let mut relation_types = ctx.env.relation_types()?;
        relation_types.sort();

        for endpoint_name in relation_types {
            let Some(constructor) = factories.get(&endpoint_name) else {
                debug!(endpoint = %endpoint_name, "No endpoint type registered; skipping");
                continue;
            };

            let mut relation_ids: Vec<RelationId> = ctx
                .env
                .relation_ids(&endpoint_name)?
                .iter()
                .map(|rid| normalize_relation_id(&endpoint_name, rid))
                .collect();
            relation_ids.sort();

            let endpoint = Endpoint::new(ctx.env.clone(), &endpoint_name, &relation_ids);
            endpoint.manage_flags(ctx, policy)?;
            for relation in endpoint.relations().iter() {
                let relation = relation.clone();
                ctx.env.atexit(Box::new(move || relation.flush()));
            }

            registry.endpoints.insert(endpoint_name, constructor(endpoint));
        }

        info!(
            endpoints = registry.endpoints.len(),
            hook = %ctx.env.hook_name(),
            "Built endpoint registry"
        );
        Ok(registry)
    }

    /// Register an already-built endpoint.
    pub fn insert(&mut self, endpoint: Arc<dyn InterfaceEndpoint>) {
        let name = endpoint.endpoint().endpoint_name().to_string();
        self.endpoints.insert(name, endpoint);
    }

    /// Endpoint serving `endpoint_name`.
    pub fn lookup_by_name(&self, endpoint_name: &str) -> Option<&Arc<dyn InterfaceEndpoint>> {
        self.endpoints.get(endpoint_name)
    }

    /// Endpoint named by a flag of the form `endpoint.<name>.<extra>`, or the
    /// legacy `<name>.<extra>`.
    pub fn lookup_by_flag(&self, flag: &str) -> Option<&Arc<dyn InterfaceEndpoint>> {
        endpoint_name_from_flag(flag).and_then(|name| self.lookup_by_name(name))
    }

    /// Endpoint serving `endpoint_name`, as its concrete type.
    pub fn lookup_as<T: InterfaceEndpoint>(&self, endpoint_name: &str) -> Option<&T> {
        self.lookup_by_name(endpoint_name)
            .and_then(|endpoint| endpoint.as_any().downcast_ref::<T>())
    }

    /// Endpoint names in ascending order.
    pub fn names(&self) -> Vec<&str> {
        self.endpoints.keys().map(|name| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn InterfaceEndpoint>> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
