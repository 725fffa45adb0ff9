use crate::{
    ErrorKind,
    store::{MemorySegmentStore, Segment, SegmentStore},
};

fn segment(bytes: &[u8]) -> Segment {
    Segment::new(bytes.to_vec(), "audio/L16;rate=8000;channels=1")
}

/// WHAT: Segments list in insertion order
/// WHY: Upload order must match recording order
#[test]
#[allow(clippy::unwrap_used)]
fn given_segments_put_when_listed_then_insertion_order() {
    // Given: Three stored segments
    let store = MemorySegmentStore::new();
    let segments = [segment(&[1]), segment(&[2]), segment(&[3])];
    for s in &segments {
        store.put(s).unwrap();
    }

    // When: Listing
    let listed = store.list_all().unwrap();

    // Then: Same order, same bytes
    assert_eq!(listed, segments.to_vec());
    assert_eq!(store.count().unwrap(), 3);
}

/// WHAT: Deleting an unknown id succeeds
/// WHY: A second delete after a retried upload must not fail the pass
#[test]
#[allow(clippy::unwrap_used)]
fn given_unknown_id_when_deleted_then_ok_and_nothing_removed() {
    // Given: One stored segment
    let store = MemorySegmentStore::new();
    store.put(&segment(&[1])).unwrap();

    // When: Deleting an id that was never stored
    let result = store.delete_by_id("missing");

    // Then: Ok, store unchanged
    assert!(result.is_ok());
    assert_eq!(store.count().unwrap(), 1);
}

/// WHAT: Putting the same id twice is rejected
/// WHY: Segment ids are unique store keys
#[test]
#[allow(clippy::unwrap_used)]
fn given_duplicate_id_when_put_then_storage_error() {
    // Given: A stored segment
    let store = MemorySegmentStore::new();
    let s = segment(&[1, 2]);
    store.put(&s).unwrap();

    // When: Putting it again
    let result = store.put(&s);

    // Then: Storage error
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Storage));
}

/// WHAT: Clear removes everything and delete removes one
/// WHY: Both are used after successful uploads
#[test]
#[allow(clippy::unwrap_used)]
fn given_segments_when_deleted_and_cleared_then_counts_follow() {
    // Given: Two segments
    let store = MemorySegmentStore::new();
    let first = segment(&[1]);
    store.put(&first).unwrap();
    store.put(&segment(&[2])).unwrap();

    // When: Deleting the first
    store.delete_by_id(&first.id).unwrap();

    // Then: One left, then none after clear
    assert_eq!(store.count().unwrap(), 1);
    store.clear().unwrap();
    assert_eq!(store.count().unwrap(), 0);
}
