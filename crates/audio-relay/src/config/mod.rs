mod behaviour_config;
#[allow(clippy::module_inception)]
mod config;
mod recording_config;
mod storage_config;
mod upload_config;

pub(crate) use {
    behaviour_config::BehaviourConfig, config::Config, recording_config::RecordingConfig,
    storage_config::StorageConfig, upload_config::UploadConfig,
};

use audio_relay_core::{DEFAULT_API_BASE, DEFAULT_SAMPLE_RATE, UploadContainer};

pub(crate) const DEFAULT_NOTIFICATIONS: bool = true;
pub(crate) const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub(crate) const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 60;
pub(crate) const DEFAULT_FRAGMENT_INTERVAL_MS: u64 = 1000;
pub(crate) const DEFAULT_MAX_BUFFERED_FRAGMENTS: usize = 600;

pub(crate) fn default_notifications() -> bool {
    DEFAULT_NOTIFICATIONS
}

pub(crate) fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

pub(crate) fn default_container() -> UploadContainer {
    UploadContainer::Wav
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

pub(crate) fn default_flush_interval_secs() -> u64 {
    DEFAULT_FLUSH_INTERVAL_SECS
}

pub(crate) fn default_fragment_interval_ms() -> u64 {
    DEFAULT_FRAGMENT_INTERVAL_MS
}

pub(crate) fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

pub(crate) fn default_max_buffered_fragments() -> usize {
    DEFAULT_MAX_BUFFERED_FRAGMENTS
}
