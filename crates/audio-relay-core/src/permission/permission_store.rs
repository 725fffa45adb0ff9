use crate::{CoreResult, RelayError, permission::PermissionState};

use std::{
    fs,
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

/// Durable mirror of the last known microphone permission, so a restart does
/// not trigger a redundant prompt.
pub trait PermissionStore: Send {
    /// Last persisted state; [`PermissionState::Unknown`] when nothing is
    /// stored or the record is unreadable.
    fn load(&self) -> PermissionState;

    /// Persist `state`.
    fn save(&self, state: PermissionState) -> CoreResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PermissionRecord {
    mic_permission: PermissionState,
}

/// `permission.toml` in the user config directory.
#[derive(Debug, Clone)]
pub struct FilePermissionStore {
    path: PathBuf,
}

impl FilePermissionStore {
    /// Store the record at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl PermissionStore for FilePermissionStore {
    fn load(&self) -> PermissionState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == IoErrorKind::NotFound => return PermissionState::Unknown,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read permission record");
                return PermissionState::Unknown;
            }
        };

        match toml::from_str::<PermissionRecord>(&contents) {
            Ok(record) => record.mic_permission,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring unreadable permission record");
                PermissionState::Unknown
            }
        }
    }

    #[track_caller]
    fn save(&self, state: PermissionState) -> CoreResult<()> {
        let contents = toml::to_string(&PermissionRecord {
            mic_permission: state,
        })
        .map_err(|e| RelayError::storage(format!("Failed to serialize permission: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                RelayError::storage(format!("Failed to create permission directory: {}", e))
            })?;
        }

        fs::write(&self.path, contents)
            .map_err(|e| RelayError::storage(format!("Failed to write permission: {}", e)))?;

        debug!(path = ?self.path, state = ?state, "Permission state saved");

        Ok(())
    }
}

/// Permission record that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryPermissionStore {
    state: Mutex<PermissionState>,
}

impl MemoryPermissionStore {
    /// Start from `state`.
    pub fn new(state: PermissionState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn load(&self) -> PermissionState {
        *self.state.lock().unwrap_or_else(|e| {
            error!("Permission lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }

    fn save(&self, state: PermissionState) -> CoreResult<()> {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
        Ok(())
    }
}
