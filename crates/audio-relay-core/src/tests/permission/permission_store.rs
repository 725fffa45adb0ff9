use crate::{FilePermissionStore, PermissionState, PermissionStore};

use std::fs;

use tempfile::TempDir;

/// WHAT: A saved state is loaded back
/// WHY: Restart must not re-prompt after permission was granted
#[test]
#[allow(clippy::unwrap_used)]
fn given_saved_state_when_loaded_then_same_state() {
    // Given: A store in a nested, not yet existing directory
    let dir = TempDir::new().unwrap();
    let store = FilePermissionStore::new(dir.path().join("nested").join("permission.toml"));

    // When: Saving Granted
    store.save(PermissionState::Granted).unwrap();

    // Then: Granted is loaded and the record uses the documented key
    assert_eq!(store.load(), PermissionState::Granted);
    let contents = fs::read_to_string(dir.path().join("nested").join("permission.toml")).unwrap();
    assert!(contents.contains("mic_permission = \"granted\""));
}

/// WHAT: Missing or unreadable records load as Unknown
/// WHY: A damaged record must never block recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_missing_or_garbage_record_when_loaded_then_unknown() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("permission.toml");
    let store = FilePermissionStore::new(&path);

    assert_eq!(store.load(), PermissionState::Unknown);

    fs::write(&path, "mic_permission = 42").unwrap();
    assert_eq!(store.load(), PermissionState::Unknown);
}
