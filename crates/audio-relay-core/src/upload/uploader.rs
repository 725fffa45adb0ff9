use crate::{CoreResult, SessionId, store::Segment};

use async_trait::async_trait;

/// Sends one segment to the remote host.
///
/// Implementations never retry; the coordinator decides when a failed
/// segment is attempted again.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Upload `segment` and return its public URL.
    ///
    /// `sequence_index` is the segment's position within the current upload
    /// pass and only feeds the remote object name.
    ///
    /// # Errors
    ///
    /// [`crate::RelayError::UploadError`] for any non-success response,
    /// transport failure or response without a URL.
    async fn upload(
        &self,
        segment: &Segment,
        session: &SessionId,
        sequence_index: usize,
    ) -> CoreResult<String>;
}
