use serde::{Deserialize, Serialize};

/// Last known microphone permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// Never asked, or the answer is not known yet.
    #[default]
    Unknown,
    /// Access granted.
    Granted,
    /// Access denied or revoked.
    Denied,
}

impl PermissionState {
    /// True when recording may start without asking.
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}
