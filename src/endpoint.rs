//! Endpoints
//!
//! An [`Endpoint`] is the local side of one relation type. It holds every
//! established relation for that type and manages four automatic flags:
//!
//! * `endpoint.{endpoint_name}.joined` while at least one relation exists.
//! * `endpoint.{endpoint_name}.changed` when any received field changed.
//! * `endpoint.{endpoint_name}.changed.{field}` when a given field changed.
//! * `endpoint.{endpoint_name}.departed` when a remote unit is leaving.
//!
//! Only `joined` is ever cleared automatically; the interface layer owns
//! clearing the others.

pub mod flags;
pub mod policy;

pub use policy::ChangeDetectionPolicy;

use crate::error::EndpointError;
use crate::hookenv::{HookContext, HookEnvironment};
use crate::relation::Relation;
use crate::sequence::KeyedSequence;
use crate::types::{normalize_relation_id, RelationId};
use crate::units::CombinedUnitsView;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// The local side of one relation type.
#[derive(Debug)]
pub struct Endpoint {
    endpoint_name: String,
    relations: KeyedSequence<Arc<Relation>>,
    all_units: OnceLock<CombinedUnitsView>,
}

impl Endpoint {
    /// Build an endpoint over the given relation ids.
    ///
    /// Ids lacking the endpoint-name prefix get it added; relations are kept
    /// in ascending relation-id order. No data is fetched until accessed.
    pub fn new(
        env: Arc<dyn HookEnvironment>,
        endpoint_name: &str,
        relation_ids: &[RelationId],
    ) -> Self {
        let mut ids: Vec<RelationId> = relation_ids
            .iter()
            .map(|rid| normalize_relation_id(endpoint_name, rid))
            .collect();
        ids.sort();
        let relations = ids
            .iter()
            .map(|rid| Arc::new(Relation::new(env.clone(), rid)));
        Self {
            endpoint_name: endpoint_name.to_string(),
            relations: KeyedSequence::new(relations),
            all_units: OnceLock::new(),
        }
    }

    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    /// Established relations, indexable by position or relation id.
    pub fn relations(&self) -> &KeyedSequence<Arc<Relation>> {
        &self.relations
    }

    /// Whether any remote application is attached.
    pub fn joined(&self) -> bool {
        !self.relations.is_empty()
    }

    /// Complete a flag for this endpoint. See [`flags::expand_name`].
    pub fn expand_name(&self, flag: &str) -> String {
        flags::expand_name(&self.endpoint_name, flag)
    }

    /// Units of every relation, ordered by relation id then unit name.
    ///
    /// Shares unit instances with [`Relation::units`]. A unit of an
    /// application related more than once appears once per relation.
    pub fn all_units(&self) -> Result<&CombinedUnitsView, EndpointError> {
        if let Some(units) = self.all_units.get() {
            return Ok(units);
        }
        let mut units = Vec::new();
        for relation in self.relations.iter() {
            units.extend(relation.units()?.iter().cloned());
        }
        let view = CombinedUnitsView::new(units);
        Ok(self.all_units.get_or_init(|| view))
    }

    /// Update the automatic flags for the current hook.
    pub fn manage_flags(
        &self,
        ctx: &HookContext,
        policy: ChangeDetectionPolicy,
    ) -> Result<(), EndpointError> {
        let joined_flag = self.expand_name(flags::JOINED);
        let already_joined = ctx.flags.is_flag_set(&joined_flag)?;
        let hook_name = ctx.env.hook_name();
        let relation_hook = hook_name.starts_with(&format!("{}-relation-", self.endpoint_name));
        let departed_hook = relation_hook && hook_name.ends_with("-departed");

        ctx.flags.toggle_flag(&joined_flag, self.joined())?;
        debug!(
            endpoint = %self.endpoint_name,
            joined = self.joined(),
            relations = self.relations.len(),
            "Toggled joined flag"
        );

        if departed_hook {
            ctx.flags.set_flag(&self.expand_name(flags::DEPARTED))?;
        }

        if policy.skip_outside_relation_hooks && already_joined && !relation_hook {
            debug!(
                endpoint = %self.endpoint_name,
                hook = %hook_name,
                "Skipping change detection outside relation hook"
            );
            return Ok(());
        }

        self.detect_changes(ctx)
    }

    /// Compare every received field against its stored baseline, raising
    /// `changed` and `changed.{field}` for each difference.
    pub fn detect_changes(&self, ctx: &HookContext) -> Result<(), EndpointError> {
        for unit in self.all_units()?.iter() {
            for (field, value) in unit.received()?.items() {
                let key = flags::change_key(
                    &self.endpoint_name,
                    unit.relation_id(),
                    unit.unit_name(),
                    &field,
                );
                if ctx.changes.data_changed(&key, &value)? {
                    debug!(
                        endpoint = %self.endpoint_name,
                        unit = %unit.unit_name(),
                        field = %field,
                        "Received field changed"
                    );
                    ctx.flags.set_flag(&self.expand_name(flags::CHANGED))?;
                    ctx.flags
                        .set_flag(&self.expand_name(&flags::changed_field(&field)))?;
                }
            }
        }
        Ok(())
    }
}
