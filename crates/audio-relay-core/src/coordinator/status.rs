use crate::{PermissionState, audio::PcmFormat};

use std::time::{Duration, Instant};

/// Whether capture is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Not capturing.
    Idle,
    /// Capture session open.
    Recording {
        /// When capture started.
        started_at: Instant,
        /// Layout of the fragments being delivered.
        format: PcmFormat,
    },
}

impl RecordingState {
    /// True while capturing.
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording { .. })
    }

    /// Time spent recording, if recording.
    pub fn elapsed(&self) -> Option<Duration> {
        match self {
            RecordingState::Idle => None,
            RecordingState::Recording { started_at, .. } => Some(started_at.elapsed()),
        }
    }
}

/// Read-only snapshot published to the presentation layer on every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorStatus {
    /// Capture is running.
    pub recording: bool,
    /// An upload pass is in flight.
    pub uploading: bool,
    /// Last known microphone permission.
    pub permission: PermissionState,
    /// Segments waiting in the local store. `None` while storage is
    /// unavailable, which hides the pending indicator.
    pub pending_segments: Option<usize>,
    /// Fragments buffered in memory since the last flush.
    pub buffered_fragments: usize,
    /// Current status line.
    pub message: String,
    /// Most recent error, cleared by the next successful action.
    pub last_error: Option<String>,
    /// Public URL of the most recently uploaded segment.
    pub last_upload_url: Option<String>,
}

impl Default for CoordinatorStatus {
    fn default() -> Self {
        Self {
            recording: false,
            uploading: false,
            permission: PermissionState::Unknown,
            pending_segments: Some(0),
            buffered_fragments: 0,
            message: "Not recording".to_string(),
            last_error: None,
            last_upload_url: None,
        }
    }
}

impl CoordinatorStatus {
    /// True when there is stored audio waiting for upload.
    pub fn has_pending(&self) -> bool {
        self.pending_segments.is_some_and(|n| n > 0)
    }
}
