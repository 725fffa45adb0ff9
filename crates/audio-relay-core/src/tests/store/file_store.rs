use crate::{
    ErrorKind,
    store::{FileSegmentStore, Segment, SegmentStore},
};

use std::fs;

use tempfile::TempDir;

fn segment(bytes: &[u8]) -> Segment {
    Segment::new(bytes.to_vec(), "audio/L16;rate=8000;channels=1")
}

/// WHAT: Segments survive reopening the store
/// WHY: Audio recorded before a crash must be uploaded after restart
#[test]
#[allow(clippy::unwrap_used)]
fn given_stored_segments_when_reopened_then_listed_in_order() {
    // Given: Two segments written to a store
    let dir = TempDir::new().unwrap();
    let first = segment(&[1, 2, 3, 4]);
    let second = segment(&[5, 6]);
    {
        let store = FileSegmentStore::open(dir.path()).unwrap();
        store.put(&first).unwrap();
        store.put(&second).unwrap();
    }

    // When: Reopening
    let store = FileSegmentStore::open(dir.path()).unwrap();

    // Then: Same segments, same order, all fields intact
    assert_eq!(store.list_all().unwrap(), vec![first, second]);
}

/// WHAT: Delete removes both the manifest entry and the payload file
/// WHY: Uploaded audio must not accumulate on disk
#[test]
#[allow(clippy::unwrap_used)]
fn given_segment_when_deleted_then_payload_file_removed() {
    // Given: A store with one segment
    let dir = TempDir::new().unwrap();
    let store = FileSegmentStore::open(dir.path()).unwrap();
    let s = segment(&[9, 9]);
    store.put(&s).unwrap();

    // When: Deleting it
    store.delete_by_id(&s.id).unwrap();

    // Then: No entries and no payload files left
    assert_eq!(store.count().unwrap(), 0);
    let payloads = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "seg"))
        .count();
    assert_eq!(payloads, 0);
}

/// WHAT: Order follows insertion even after deletes in the middle
/// WHY: Later segments must never overtake earlier ones
#[test]
#[allow(clippy::unwrap_used)]
fn given_middle_segment_deleted_when_new_put_then_new_listed_last() {
    // Given: Three segments with the middle one removed
    let dir = TempDir::new().unwrap();
    let store = FileSegmentStore::open(dir.path()).unwrap();
    let a = segment(&[1]);
    let b = segment(&[2]);
    let c = segment(&[3]);
    store.put(&a).unwrap();
    store.put(&b).unwrap();
    store.delete_by_id(&b.id).unwrap();

    // When: Putting another
    store.put(&c).unwrap();

    // Then: a, c
    let ids: Vec<String> = store.list_all().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![a.id, c.id]);
}

/// WHAT: A missing payload file is skipped and its entry dropped
/// WHY: One damaged segment must not block the rest or linger as pending
#[test]
#[allow(clippy::unwrap_used)]
fn given_payload_file_missing_when_listed_then_entry_dropped_from_manifest() {
    // Given: Two segments, the first of which loses its payload file
    let dir = TempDir::new().unwrap();
    let store = FileSegmentStore::open(dir.path()).unwrap();
    let a = segment(&[1]);
    let b = segment(&[2]);
    store.put(&a).unwrap();
    store.put(&b).unwrap();
    fs::remove_file(dir.path().join(format!("{:020}.seg", 0))).unwrap();

    // When: Listing
    let listed = store.list_all().unwrap();

    // Then: Only the intact one, and the manifest no longer names the lost one
    assert_eq!(listed, vec![b.clone()]);
    let manifest = fs::read_to_string(dir.path().join("index.toml")).unwrap();
    assert!(!manifest.contains(&a.id));

    let reopened = FileSegmentStore::open(dir.path()).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
    assert_eq!(reopened.list_all().unwrap(), vec![b]);
}

/// WHAT: Count ignores entries whose payload file is gone
/// WHY: A dangling entry must not keep the pending indicator up or trigger passes
#[test]
#[allow(clippy::unwrap_used)]
fn given_payload_file_missing_when_counted_then_not_counted() {
    // Given: One segment whose payload file was removed behind the store's back
    let dir = TempDir::new().unwrap();
    let store = FileSegmentStore::open(dir.path()).unwrap();
    store.put(&segment(&[1, 2])).unwrap();
    fs::remove_file(dir.path().join(format!("{:020}.seg", 0))).unwrap();

    // When: Counting
    let count = store.count().unwrap();

    // Then: Nothing pending
    assert_eq!(count, 0);
}

/// WHAT: A corrupt manifest fails to open
/// WHY: The coordinator falls back to memory instead of overwriting data
#[test]
#[allow(clippy::unwrap_used)]
fn given_corrupt_manifest_when_opened_then_storage_error() {
    // Given: Garbage in the manifest
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.toml"), "segments = [[[").unwrap();

    // When: Opening
    let result = FileSegmentStore::open(dir.path());

    // Then: Storage error
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Storage));
}

/// WHAT: Clear empties the store
/// WHY: Used after a pass that uploaded everything
#[test]
#[allow(clippy::unwrap_used)]
fn given_segments_when_cleared_then_empty() {
    // Given: Two segments
    let dir = TempDir::new().unwrap();
    let store = FileSegmentStore::open(dir.path()).unwrap();
    store.put(&segment(&[1])).unwrap();
    store.put(&segment(&[2])).unwrap();

    // When: Clearing
    store.clear().unwrap();

    // Then: Nothing listed
    assert!(store.list_all().unwrap().is_empty());
}
