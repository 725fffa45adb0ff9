use crate::{
    CoreResult, RelayError,
    store::{Segment, SegmentStore},
};

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, error};

/// Process-lifetime segment store.
///
/// Used when the durable store cannot be opened, and by tests.
#[derive(Debug, Default)]
pub struct MemorySegmentStore {
    segments: Mutex<Vec<Segment>>,
}

impl MemorySegmentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Segment>> {
        // A poisoned lock still guards a valid Vec.
        self.segments.lock().unwrap_or_else(|e| {
            error!("Segment store lock poisoned, recovering: {}", e);
            e.into_inner()
        })
    }
}

impl SegmentStore for MemorySegmentStore {
    #[track_caller]
    fn put(&self, segment: &Segment) -> CoreResult<()> {
        let mut segments = self.lock();
        if segments.iter().any(|s| s.id == segment.id) {
            return Err(RelayError::storage(format!(
                "Segment {} already stored",
                segment.id
            )));
        }
        segments.push(segment.clone());
        debug!(segment_id = %segment.id, bytes = segment.len(), "Segment stored in memory");
        Ok(())
    }

    fn list_all(&self) -> CoreResult<Vec<Segment>> {
        Ok(self.lock().clone())
    }

    fn delete_by_id(&self, id: &str) -> CoreResult<()> {
        self.lock().retain(|s| s.id != id);
        Ok(())
    }

    fn clear(&self) -> CoreResult<()> {
        self.lock().clear();
        Ok(())
    }

    fn count(&self) -> CoreResult<usize> {
        Ok(self.lock().len())
    }
}
