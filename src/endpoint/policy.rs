//! Change-detection policy applied when endpoint flags are managed.

use serde::{Deserialize, Serialize};

/// Policy for the remote-data change detection run at hook start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDetectionPolicy {
    /// Skip change detection when the endpoint was already joined and the
    /// hook is not a relation hook for it. Saves a `relation_get` per remote
    /// unit on every unrelated hook. Detection still runs the first time the
    /// endpoint becomes joined.
    #[serde(default = "default_true")]
    pub skip_outside_relation_hooks: bool,
}

fn default_true() -> bool {
    true
}

impl ChangeDetectionPolicy {
    /// Compare remote data on every hook.
    pub fn always() -> Self {
        Self {
            skip_outside_relation_hooks: false,
        }
    }
}

impl Default for ChangeDetectionPolicy {
    fn default() -> Self {
        Self {
            skip_outside_relation_hooks: default_true(),
        }
    }
}
