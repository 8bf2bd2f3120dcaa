use serde::{Deserialize, Serialize};

/// What a nullable field stores when it holds no value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// Store an explicit null.
    #[default]
    Store,
    /// Leave the property out of the record.
    Omit,
}

/// Settings shared by every save and load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Maximum nesting depth of containers and embedded structs.
    pub max_depth: usize,
    /// Policy used by `Translators::register_option`.
    pub null_policy: NullPolicy,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            null_policy: NullPolicy::Store,
        }
    }
}
