use crate::config::{default_api_base, default_container, default_request_timeout_secs};

use audio_relay_core::UploadContainer;
use serde::{Deserialize, Serialize};

/// Cloudinary upload configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Account cloud name.
    #[serde(default)]
    pub cloud_name: String,

    /// Unsigned upload preset.
    #[serde(default)]
    pub upload_preset: String,

    /// API scheme and host.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// `wav` or `raw`.
    #[serde(default = "default_container")]
    pub container: UploadContainer,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            cloud_name: String::new(),
            upload_preset: String::new(),
            api_base: default_api_base(),
            container: default_container(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
