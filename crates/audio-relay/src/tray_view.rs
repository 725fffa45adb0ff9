use crate::TrayIconState;

use audio_relay_core::{CoordinatorStatus, PermissionState};

const APP_NAME: &str = "Audio Relay";

/// Everything the tray shows, derived from one status snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrayView {
    /// Icon to display.
    pub state: TrayIconState,
    /// Hover text.
    pub tooltip: String,
    /// Text of the start/stop menu item.
    pub toggle_label: &'static str,
    /// Upload Now is clickable.
    pub upload_enabled: bool,
    /// Request Microphone Permission is clickable.
    pub permission_enabled: bool,
    /// Open/Copy Last Upload are clickable.
    pub last_upload_available: bool,
}

impl TrayView {
    /// Map a coordinator snapshot onto the tray.
    pub fn from_status(status: &CoordinatorStatus) -> Self {
        let state = if status.recording {
            TrayIconState::Recording
        } else if status.uploading {
            TrayIconState::Uploading
        } else if status.permission == PermissionState::Denied {
            TrayIconState::PermissionNeeded
        } else {
            TrayIconState::Idle
        };

        let pending = match status.pending_segments {
            Some(0) => String::new(),
            Some(1) => " (1 segment pending)".to_string(),
            Some(n) => format!(" ({} segments pending)", n),
            None => " (local storage unavailable)".to_string(),
        };

        Self {
            state,
            tooltip: format!("{} - {}{}", APP_NAME, status.message, pending),
            toggle_label: if status.recording {
                "Stop Recording"
            } else {
                "Start Recording"
            },
            upload_enabled: !status.uploading,
            permission_enabled: !status.permission.is_granted(),
            last_upload_available: status.last_upload_url.is_some(),
        }
    }
}

impl Default for TrayView {
    fn default() -> Self {
        Self::from_status(&CoordinatorStatus::default())
    }
}
