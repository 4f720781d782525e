use serde::{Deserialize, Serialize};

use crate::nodes::{CorrectionConfig, DetectorConfig};

/// Tuning knobs for one preprocessor instance. Every field has an
/// empirically chosen default, so a partial (or empty) JSON document is a
/// valid configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub detector: DetectorConfig,
    pub correction: CorrectionConfig,
}

impl PreprocessorConfig {
    pub fn from_json_str(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
