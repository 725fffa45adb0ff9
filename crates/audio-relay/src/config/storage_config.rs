use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Local segment storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for pending segments (None = `segments/` in the data dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_dir: Option<PathBuf>,
}
