//! Core identifier types and their wire formats.

use std::collections::BTreeMap;

/// RelationId: `"<endpoint-name>:<numeric-id>"`
pub type RelationId = String;

/// UnitName: `"<application>/<index>"`
pub type UnitName = String;

/// Raw relation data for one unit on one relation, as it travels on the wire.
pub type RawData = BTreeMap<String, String>;

/// Ensure a relation id carries its endpoint-name prefix.
///
/// The environment may report ids without the prefix; those are rewritten as
/// `"<endpoint_name>:<rid>"`. Ids that already contain a `:` are kept as is.
pub fn normalize_relation_id(endpoint_name: &str, rid: &str) -> RelationId {
    if rid.contains(':') {
        rid.to_string()
    } else {
        format!("{}:{}", endpoint_name, rid)
    }
}

/// Endpoint name part of a relation id.
pub fn endpoint_name_of(relation_id: &str) -> &str {
    relation_id.split(':').next().unwrap_or(relation_id)
}

/// Application name part of a unit name.
pub fn application_name_of(unit_name: &str) -> &str {
    unit_name.split('/').next().unwrap_or(unit_name)
}
