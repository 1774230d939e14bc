//! Automatic endpoint flag names.

/// Placeholder substituted with the endpoint name by [`expand_name`].
pub const ENDPOINT_NAME_PLACEHOLDER: &str = "{endpoint_name}";

/// Set while the endpoint has at least one relation.
pub const JOINED: &str = "joined";

/// Set when any field received from a remote unit changed.
pub const CHANGED: &str = "changed";

/// Set during a `-relation-departed` hook for the endpoint.
pub const DEPARTED: &str = "departed";

/// Complete a flag for an endpoint.
///
/// Flags without the `{endpoint_name}` placeholder are prefixed with
/// `endpoint.{endpoint_name}.`; the placeholder is then replaced.
pub fn expand_name(endpoint_name: &str, flag: &str) -> String {
    let template = if flag.contains(ENDPOINT_NAME_PLACEHOLDER) {
        flag.to_string()
    } else {
        format!("endpoint.{}.{}", ENDPOINT_NAME_PLACEHOLDER, flag)
    };
    template.replace(ENDPOINT_NAME_PLACEHOLDER, endpoint_name)
}

/// Flag for a single changed field, before expansion.
pub fn changed_field(field: &str) -> String {
    format!("{}.{}", CHANGED, field)
}

/// Endpoint name embedded in a flag.
///
/// Accepts `endpoint.<name>.<extra>` and, for older handlers, `<name>.<extra>`.
/// Returns `None` for flags without a `.` separator.
pub fn endpoint_name_from_flag(flag: &str) -> Option<&str> {
    if !flag.contains('.') {
        return None;
    }
    let mut parts = flag.split('.');
    match parts.next() {
        Some("endpoint") => parts.next(),
        other => other,
    }
}

/// Change-store key for one field of one unit on one relation.
pub fn change_key(endpoint_name: &str, relation_id: &str, unit_name: &str, field: &str) -> String {
    format!(
        "endpoint.{}.{}.{}.{}",
        endpoint_name, relation_id, unit_name, field
    )
}
