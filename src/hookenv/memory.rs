//! In-memory collaborators.
//!
//! Back the endpoint layer with plain maps instead of a live hook environment.
//! Interface layers use these to exercise their handlers in tests.

use crate::error::EndpointError;
use crate::hookenv::contract::{ChangeStore, ExitCallback, FlagStore, HookEnvironment};
use crate::types::{normalize_relation_id, RawData, RelationId, UnitName};
use crate::views::encode;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct MemoryState {
    hook_name: String,
    local_unit: UnitName,
    /// relation type -> relation ids as the environment reports them
    relation_ids: BTreeMap<String, Vec<String>>,
    /// normalized relation id -> remote unit -> data
    remote_data: BTreeMap<RelationId, BTreeMap<UnitName, RawData>>,
    /// normalized relation id -> local unit data
    local_data: BTreeMap<RelationId, RawData>,
    writes: Vec<(RelationId, RawData)>,
}

/// Hook environment held entirely in memory.
#[derive(Default)]
pub struct MemoryEnvironment {
    state: RwLock<MemoryState>,
    callbacks: Mutex<Vec<ExitCallback>>,
    relation_get_calls: AtomicUsize,
}

impl MemoryEnvironment {
    pub fn new(local_unit: &str) -> Self {
        let env = Self::default();
        env.state.write().local_unit = local_unit.to_string();
        env
    }

    pub fn set_hook_name(&self, hook_name: &str) {
        self.state.write().hook_name = hook_name.to_string();
    }

    /// Declare a relation type with no active relations.
    pub fn add_relation_type(&self, relation_type: &str) {
        self.state
            .write()
            .relation_ids
            .entry(relation_type.to_string())
            .or_default();
    }

    /// Add an active relation. `reported_id` is returned verbatim from
    /// `relation_ids`, so it may be given without the type prefix.
    pub fn add_relation(&self, relation_type: &str, reported_id: &str) -> RelationId {
        let relation_id = normalize_relation_id(relation_type, reported_id);
        let mut state = self.state.write();
        let ids = state
            .relation_ids
            .entry(relation_type.to_string())
            .or_default();
        if !ids.iter().any(|id| id == reported_id) {
            ids.push(reported_id.to_string());
        }
        state.remote_data.entry(relation_id.clone()).or_default();
        relation_id
    }

    /// Remove a relation, as after its last unit departed.
    pub fn remove_relation(&self, relation_id: &str) {
        let mut state = self.state.write();
        for (relation_type, ids) in state.relation_ids.iter_mut() {
            ids.retain(|id| normalize_relation_id(relation_type, id) != relation_id);
        }
        state.remote_data.remove(relation_id);
        state.local_data.remove(relation_id);
    }

    /// Set a remote unit's data, attaching the unit to the relation.
    pub fn set_unit_data(&self, relation_id: &str, unit: &str, data: RawData) {
        self.state
            .write()
            .remote_data
            .entry(relation_id.to_string())
            .or_default()
            .insert(unit.to_string(), data);
    }

    /// Seed what the local unit has already published on a relation.
    pub fn set_local_data(&self, relation_id: &str, data: RawData) {
        self.state
            .write()
            .local_data
            .insert(relation_id.to_string(), data);
    }

    /// Everything written through `relation_set`, in order.
    pub fn writes(&self) -> Vec<(RelationId, RawData)> {
        self.state.read().writes.clone()
    }

    /// Number of `relation_get` calls served so far.
    pub fn relation_get_calls(&self) -> usize {
        self.relation_get_calls.load(Ordering::SeqCst)
    }

    pub fn pending_callbacks(&self) -> usize {
        self.callbacks.lock().len()
    }
}

impl HookEnvironment for MemoryEnvironment {
    fn relation_types(&self) -> Result<Vec<String>, EndpointError> {
        Ok(self.state.read().relation_ids.keys().cloned().collect())
    }

    fn relation_ids(&self, relation_type: &str) -> Result<Vec<RelationId>, EndpointError> {
        Ok(self
            .state
            .read()
            .relation_ids
            .get(relation_type)
            .cloned()
            .unwrap_or_default())
    }

    fn related_units(&self, relation_id: &str) -> Result<Vec<UnitName>, EndpointError> {
        let state = self.state.read();
        let units = state
            .remote_data
            .get(relation_id)
            .ok_or_else(|| EndpointError::Environment(format!("Unknown relation: {}", relation_id)))?;
        Ok(units.keys().cloned().collect())
    }

    fn relation_get(&self, unit: &str, relation_id: &str) -> Result<RawData, EndpointError> {
        self.relation_get_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.read();
        if unit == state.local_unit {
            return Ok(state.local_data.get(relation_id).cloned().unwrap_or_default());
        }
        let units = state
            .remote_data
            .get(relation_id)
            .ok_or_else(|| EndpointError::Environment(format!("Unknown relation: {}", relation_id)))?;
        Ok(units.get(unit).cloned().unwrap_or_default())
    }

    fn relation_set(&self, relation_id: &str, data: &RawData) -> Result<(), EndpointError> {
        let mut state = self.state.write();
        let local = state.local_data.entry(relation_id.to_string()).or_default();
        for (key, value) in data {
            local.insert(key.clone(), value.clone());
        }
        state.writes.push((relation_id.to_string(), data.clone()));
        Ok(())
    }

    fn hook_name(&self) -> String {
        self.state.read().hook_name.clone()
    }

    fn local_unit(&self) -> UnitName {
        self.state.read().local_unit.clone()
    }

    fn atexit(&self, callback: ExitCallback) {
        self.callbacks.lock().push(callback);
    }

    fn run_atexit(&self) -> Result<(), EndpointError> {
        let callbacks = std::mem::take(&mut *self.callbacks.lock());
        for callback in callbacks {
            callback()?;
        }
        Ok(())
    }

    fn discard_atexit(&self) {
        self.callbacks.lock().clear();
    }
}

/// Flag store held in memory.
#[derive(Default)]
pub struct MemoryFlagStore {
    flags: RwLock<BTreeSet<String>>,
}

impl MemoryFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All currently set flags, sorted.
    pub fn flags(&self) -> Vec<String> {
        self.flags.read().iter().cloned().collect()
    }
}

impl FlagStore for MemoryFlagStore {
    fn set_flag(&self, flag: &str) -> Result<(), EndpointError> {
        self.flags.write().insert(flag.to_string());
        Ok(())
    }

    fn clear_flag(&self, flag: &str) -> Result<(), EndpointError> {
        self.flags.write().remove(flag);
        Ok(())
    }

    fn is_flag_set(&self, flag: &str) -> Result<bool, EndpointError> {
        Ok(self.flags.read().contains(flag))
    }
}

/// Previous-value store that keeps a blake3 digest of each value's
/// canonical (sorted-key) JSON encoding.
#[derive(Default)]
pub struct MemoryChangeStore {
    digests: RwLock<HashMap<String, String>>,
}

impl MemoryChangeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored digest for `key`, hex encoded.
    pub fn digest(&self, key: &str) -> Option<String> {
        self.digests.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.digests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.read().is_empty()
    }
}

pub(crate) fn value_digest(value: &Value) -> Result<String, EndpointError> {
    let canonical = encode(value)?;
    Ok(hex::encode(blake3::hash(canonical.as_bytes()).as_bytes()))
}

impl ChangeStore for MemoryChangeStore {
    fn data_changed(&self, key: &str, value: &Value) -> Result<bool, EndpointError> {
        let digest = value_digest(value)?;
        let mut digests = self.digests.write();
        if digests.get(key) == Some(&digest) {
            return Ok(false);
        }
        digests.insert(key.to_string(), digest);
        Ok(true)
    }
}
