//! Ports the endpoint layer needs from the hook runtime.

use crate::error::EndpointError;
use crate::types::{RawData, RelationId, UnitName};
use serde_json::Value;

/// Callback run once after the current hook completes successfully.
pub type ExitCallback = Box<dyn FnOnce() -> Result<(), EndpointError> + Send>;

/// The hook-execution environment the endpoint layer reads from and publishes to.
pub trait HookEnvironment: Send + Sync {
    /// Names of all relation types (endpoints) the local application declares.
    fn relation_types(&self) -> Result<Vec<String>, EndpointError>;

    /// Active relation ids for a relation type. Ids may lack the type prefix.
    fn relation_ids(&self, relation_type: &str) -> Result<Vec<RelationId>, EndpointError>;

    /// Remote unit names attached to a relation.
    fn related_units(&self, relation_id: &str) -> Result<Vec<UnitName>, EndpointError>;

    /// Data a unit has set on a relation. Missing keys are simply absent.
    fn relation_get(&self, unit: &str, relation_id: &str) -> Result<RawData, EndpointError>;

    /// Publish the local unit's data on a relation.
    fn relation_set(&self, relation_id: &str, data: &RawData) -> Result<(), EndpointError>;

    fn hook_name(&self) -> String;

    fn local_unit(&self) -> UnitName;

    /// Register a callback to run once the hook completes successfully.
    fn atexit(&self, callback: ExitCallback);

    /// Run registered callbacks in registration order, stopping at the first error.
    fn run_atexit(&self) -> Result<(), EndpointError>;

    /// Drop registered callbacks without running them.
    fn discard_atexit(&self);
}

/// Persistent named boolean flags.
pub trait FlagStore: Send + Sync {
    fn set_flag(&self, flag: &str) -> Result<(), EndpointError>;

    fn clear_flag(&self, flag: &str) -> Result<(), EndpointError>;

    fn is_flag_set(&self, flag: &str) -> Result<bool, EndpointError>;

    /// Set or clear `flag` so that it matches `should_set`.
    fn toggle_flag(&self, flag: &str, should_set: bool) -> Result<(), EndpointError> {
        if should_set {
            self.set_flag(flag)
        } else {
            self.clear_flag(flag)
        }
    }
}

/// Persistent store of previously seen values, used for change detection.
pub trait ChangeStore: Send + Sync {
    /// Whether `value` differs from the one last stored under `key`.
    ///
    /// Stores `value` as the new baseline when it differs. A key seen for the
    /// first time counts as changed.
    fn data_changed(&self, key: &str, value: &Value) -> Result<bool, EndpointError>;
}
