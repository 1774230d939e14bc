//! Remote Units
//!
//! A [`RemoteUnit`] is one peer on one relation, with the data it has sent us.
//! A [`CombinedUnitsView`] is an ordered list of remote units that also offers
//! a single merged view of all their data.

use crate::error::EndpointError;
use crate::hookenv::HookEnvironment;
use crate::sequence::{Keyed, KeyedSequence};
use crate::types::{application_name_of, RawData, RelationId, UnitName};
use crate::views::{JsonDataView, UnitDataView};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A remote unit on a relation.
///
/// Received data is fetched from the environment on first access and cached
/// for the rest of the hook.
pub struct RemoteUnit {
    relation_id: RelationId,
    unit_name: UnitName,
    env: Arc<dyn HookEnvironment>,
    received: OnceLock<JsonDataView>,
}

impl RemoteUnit {
    pub fn new(env: Arc<dyn HookEnvironment>, relation_id: &str, unit_name: &str) -> Self {
        Self {
            relation_id: relation_id.to_string(),
            unit_name: unit_name.to_string(),
            env,
            received: OnceLock::new(),
        }
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    /// Application part of the unit name (`"wordpress"` for `"wordpress/0"`).
    pub fn application_name(&self) -> &str {
        application_name_of(&self.unit_name)
    }

    /// Id of the relation this unit belongs to.
    pub fn relation_id(&self) -> &str {
        &self.relation_id
    }

    /// Data received from this unit, with values decoded as JSON.
    pub fn received(&self) -> Result<&JsonDataView, EndpointError> {
        if let Some(view) = self.received.get() {
            return Ok(view);
        }
        debug!(
            unit = %self.unit_name,
            relation_id = %self.relation_id,
            "Fetching remote unit data"
        );
        let data = self.env.relation_get(&self.unit_name, &self.relation_id)?;
        let view = JsonDataView::new(UnitDataView::new(data));
        Ok(self.received.get_or_init(|| view))
    }

    /// Data received from this unit, as raw strings.
    pub fn received_raw(&self) -> Result<&UnitDataView, EndpointError> {
        Ok(self.received()?.raw_data())
    }
}

impl Keyed for RemoteUnit {
    fn key(&self) -> &str {
        &self.unit_name
    }
}

impl fmt::Debug for RemoteUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteUnit")
            .field("relation_id", &self.relation_id)
            .field("unit_name", &self.unit_name)
            .finish()
    }
}

/// Units ordered by relation id then unit name, keyed by unit name.
///
/// Keyed lookup of a unit name present on several relations returns the one
/// from the lowest relation id. The merged [`received`](Self::received) view
/// holds every unit's data; when several units set the same field, the unit
/// with the lowest relation id and unit name wins.
#[derive(Debug)]
pub struct CombinedUnitsView {
    units: KeyedSequence<Arc<RemoteUnit>>,
    merged: OnceLock<JsonDataView>,
}

impl CombinedUnitsView {
    pub fn new(units: impl IntoIterator<Item = Arc<RemoteUnit>>) -> Self {
        let mut units: Vec<Arc<RemoteUnit>> = units.into_iter().collect();
        units.sort_by(|a, b| {
            (a.relation_id(), a.unit_name()).cmp(&(b.relation_id(), b.unit_name()))
        });
        Self {
            units: KeyedSequence::new(units),
            merged: OnceLock::new(),
        }
    }

    /// Merged data of all units, with values decoded as JSON.
    pub fn received(&self) -> Result<&JsonDataView, EndpointError> {
        if let Some(view) = self.merged.get() {
            return Ok(view);
        }
        // Later units are applied first so that earlier ones overwrite them.
        let mut merged = RawData::new();
        for unit in self.units.iter().rev() {
            for (key, value) in unit.received_raw()?.iter() {
                merged.insert(key.clone(), value.clone());
            }
        }
        let view = JsonDataView::new(UnitDataView::new(merged));
        Ok(self.merged.get_or_init(|| view))
    }

    /// Merged data of all units, as raw strings.
    pub fn received_raw(&self) -> Result<&UnitDataView, EndpointError> {
        Ok(self.received()?.raw_data())
    }
}

impl Deref for CombinedUnitsView {
    type Target = KeyedSequence<Arc<RemoteUnit>>;

    fn deref(&self) -> &Self::Target {
        &self.units
    }
}

impl<'a> IntoIterator for &'a CombinedUnitsView {
    type Item = &'a Arc<RemoteUnit>;
    type IntoIter = std::slice::Iter<'a, Arc<RemoteUnit>>;

    fn into_iter(self) -> Self::IntoIter {
        self.units.iter()
    }
}
