use crate::{CoreResult, store::Segment};

/// Durable key-value store for segments awaiting upload.
///
/// Implementations must tolerate the backing storage disappearing at any
/// time and report it as [`crate::RelayError::StorageError`] rather than
/// panicking. The coordinator treats every storage failure as non-fatal.
pub trait SegmentStore: Send + Sync {
    /// Persist a new segment. Fails if the id is already present.
    fn put(&self, segment: &Segment) -> CoreResult<()>;

    /// Every stored segment, oldest first by insertion.
    fn list_all(&self) -> CoreResult<Vec<Segment>>;

    /// Remove one segment. Unknown ids are a no-op.
    fn delete_by_id(&self, id: &str) -> CoreResult<()>;

    /// Remove every segment.
    fn clear(&self) -> CoreResult<()>;

    /// Number of stored segments.
    fn count(&self) -> CoreResult<usize>;
}
