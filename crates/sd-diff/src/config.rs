use serde::{Deserialize, Serialize};

/// Configuration for diff computation and patch application.
///
/// Sibling identities are always required to be unique at every level the
/// diff descends into; there is no setting that relaxes this.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum nesting depth walked by diff and patch.
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}
