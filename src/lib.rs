//! Reactive Endpoints: per-hook views of relation data
//!
//! Models the data exchanged between a local unit and the remote units it is
//! related to. Each hook invocation rebuilds a snapshot of every endpoint,
//! relation and remote unit, raises flags describing what changed, and
//! publishes the local unit's modified data only if the hook succeeds.

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod hookenv;
pub mod logging;
pub mod registry;
pub mod relation;
pub mod sequence;
pub mod types;
pub mod units;
pub mod views;

pub use dispatch::{run_event, run_event_with_config};
pub use endpoint::{ChangeDetectionPolicy, Endpoint};
pub use error::EndpointError;
pub use hookenv::{ChangeStore, FlagStore, HookContext, HookEnvironment};
pub use registry::{EndpointFactories, EndpointRegistry, InterfaceEndpoint};
pub use relation::Relation;
pub use sequence::{Keyed, KeyedSequence};
pub use units::{CombinedUnitsView, RemoteUnit};
pub use views::{DataView, JsonDataView, UnitDataView};
