//! Desktop notifications for upload results and errors.

use audio_relay_core::CoordinatorStatus;
use notify_rust::Notification;
use tracing::{debug, warn};

const APP_NAME: &str = "Audio Relay";

/// Shows a desktop notification when an upload lands or a new error appears.
#[derive(Debug, Clone, Copy)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    /// Create a notifier; a disabled one stays silent.
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Compare two consecutive snapshots and notify about what changed.
    pub fn on_status(&self, previous: &CoordinatorStatus, next: &CoordinatorStatus) {
        if !self.enabled {
            return;
        }

        let Some((summary, body)) = notification_for(previous, next) else {
            return;
        };

        // The D-Bus round trip blocks on Linux.
        tokio::task::spawn_blocking(move || {
            let shown = Notification::new()
                .appname(APP_NAME)
                .summary(summary)
                .body(&body)
                .show()
                .map(|_| ());

            match shown {
                Ok(()) => debug!(summary, "Notification shown"),
                Err(e) => warn!(error = %e, "Failed to show notification"),
            }
        });
    }
}

/// Summary and body for the transition `previous -> next`, if it is worth a
/// notification. A new error wins over a new upload.
pub(crate) fn notification_for(
    previous: &CoordinatorStatus,
    next: &CoordinatorStatus,
) -> Option<(&'static str, String)> {
    if let Some(error) = &next.last_error {
        if previous.last_error.as_ref() != Some(error) {
            return Some(("Audio Relay error", error.clone()));
        }
    }

    if let Some(url) = &next.last_upload_url {
        if previous.last_upload_url.as_ref() != Some(url) {
            return Some(("Audio uploaded", url.clone()));
        }
    }

    None
}
