//! Relations
//!
//! One active relation of an endpoint: the remote units attached to it and the
//! data the local unit publishes on it. Published data is buffered for the
//! whole hook and written back once, after the hook succeeds.

use crate::error::EndpointError;
use crate::hookenv::HookEnvironment;
use crate::sequence::Keyed;
use crate::types::{endpoint_name_of, RelationId};
use crate::units::{CombinedUnitsView, RemoteUnit};
use crate::views::{DataView, JsonDataView, UnitDataView};
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

/// An established relation.
pub struct Relation {
    relation_id: RelationId,
    env: Arc<dyn HookEnvironment>,
    units: OnceLock<CombinedUnitsView>,
    publish: OnceLock<Mutex<JsonDataView>>,
    flushed: AtomicBool,
}

impl Relation {
    /// `relation_id` must already carry its endpoint-name prefix.
    pub fn new(env: Arc<dyn HookEnvironment>, relation_id: &str) -> Self {
        Self {
            relation_id: relation_id.to_string(),
            env,
            units: OnceLock::new(),
            publish: OnceLock::new(),
            flushed: AtomicBool::new(false),
        }
    }

    pub fn relation_id(&self) -> &str {
        &self.relation_id
    }

    /// Name of the endpoint this relation belongs to.
    pub fn endpoint_name(&self) -> &str {
        endpoint_name_of(&self.relation_id)
    }

    /// Name of the remote application, or `None` while no unit has joined.
    pub fn application_name(&self) -> Result<Option<&str>, EndpointError> {
        Ok(self.units()?.first().map(|unit| unit.application_name()))
    }

    /// Remote units on this relation, ordered by unit name.
    pub fn units(&self) -> Result<&CombinedUnitsView, EndpointError> {
        if let Some(units) = self.units.get() {
            return Ok(units);
        }
        let mut names = self.env.related_units(&self.relation_id)?;
        names.sort();
        debug!(
            relation_id = %self.relation_id,
            units = names.len(),
            "Loaded related units"
        );
        let view = CombinedUnitsView::new(
            names
                .iter()
                .map(|name| Arc::new(RemoteUnit::new(self.env.clone(), &self.relation_id, name))),
        );
        Ok(self.units.get_or_init(|| view))
    }

    /// Data the local unit publishes on this relation, JSON encoded.
    ///
    /// Seeded from what the local unit has already published. Changes are
    /// written back when the hook completes successfully and discarded if
    /// it fails.
    ///
    /// Only one handle to the publish data may be held at a time: while a
    /// guard from this method or [`to_publish_raw`](Self::to_publish_raw)
    /// is alive, further calls return [`EndpointError::PublishInUse`].
    /// Use [`JsonDataView::raw_data_mut`] on the held guard to mix the two.
    pub fn to_publish(&self) -> Result<MutexGuard<'_, JsonDataView>, EndpointError> {
        self.publish_cell()?
            .try_lock()
            .ok_or_else(|| EndpointError::PublishInUse(self.relation_id.clone()))
    }

    /// Raw form of [`to_publish`](Self::to_publish), for interfaces that do
    /// not use JSON encoding.
    pub fn to_publish_raw(&self) -> Result<MappedMutexGuard<'_, UnitDataView>, EndpointError> {
        let guard = self.to_publish()?;
        Ok(MutexGuard::map(guard, |view| view.raw_data_mut()))
    }

    fn publish_cell(&self) -> Result<&Mutex<JsonDataView>, EndpointError> {
        if let Some(cell) = self.publish.get() {
            return Ok(cell);
        }
        let local_unit = self.env.local_unit();
        let data = self.env.relation_get(&local_unit, &self.relation_id)?;
        let view = JsonDataView::new(UnitDataView::writeable(data));
        Ok(self.publish.get_or_init(|| Mutex::new(view)))
    }

    /// Publish the buffered local data if it was modified.
    ///
    /// Only called from the exit callback registered when the endpoint
    /// registry is built.
    pub(crate) fn flush(&self) -> Result<(), EndpointError> {
        let Some(cell) = self.publish.get() else {
            return Ok(());
        };
        let view = cell.lock();
        if !view.modified() || self.flushed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!(
            relation_id = %self.relation_id,
            keys = view.raw_data().len(),
            "Publishing local relation data"
        );
        self.env.relation_set(&self.relation_id, view.raw_data().data())
    }
}

impl Keyed for Relation {
    fn key(&self) -> &str {
        &self.relation_id
    }
}

impl fmt::Debug for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("relation_id", &self.relation_id)
            .finish()
    }
}
