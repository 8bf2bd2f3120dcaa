use serde::{Deserialize, Serialize};
use trove_translate::TranslateConfig;

use crate::error::{SdkError, SdkResult};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkConfig {
    pub translate: TranslateConfig,
    /// Stop `save_all` at the first failing entity.
    pub stop_batch_on_error: bool,
}

impl SdkConfig {
    /// Parse a TOML document; missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> SdkResult<Self> {
        toml::from_str(source).map_err(|e| SdkError::Config(e.to_string()))
    }
}
