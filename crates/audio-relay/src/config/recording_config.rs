use crate::config::{
    default_flush_interval_secs, default_fragment_interval_ms, default_max_buffered_fragments,
    default_sample_rate,
};

use serde::{Deserialize, Serialize};

/// Capture and flush cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Seconds between periodic flush-and-upload cycles.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    /// Milliseconds of audio per fragment.
    #[serde(default = "default_fragment_interval_ms")]
    pub fragment_interval_ms: u64,

    /// Target sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Fragments held in memory while storage is unavailable.
    #[serde(default = "default_max_buffered_fragments")]
    pub max_buffered_fragments: usize,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            flush_interval_secs: default_flush_interval_secs(),
            fragment_interval_ms: default_fragment_interval_ms(),
            sample_rate: default_sample_rate(),
            max_buffered_fragments: default_max_buffered_fragments(),
        }
    }
}
