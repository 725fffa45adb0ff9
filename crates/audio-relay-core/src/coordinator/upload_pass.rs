use crate::{CoreResult, RelayError, SessionId, store::SegmentStore, upload::Uploader};

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

/// A segment that made it to the remote host and out of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedSegment {
    /// Store id of the segment.
    pub segment_id: String,
    /// Public URL returned by the host.
    pub url: String,
}

/// Why a pass stopped early.
#[derive(Debug)]
pub struct PassFailure {
    /// Segment being processed when the pass stopped, if any.
    pub segment_id: Option<String>,
    /// What went wrong.
    pub error: RelayError,
}

/// Outcome of one upload pass.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Segments uploaded and deleted, in pass order.
    pub uploaded: Vec<UploadedSegment>,
    /// Segments found in the store when the pass began.
    pub listed: usize,
    /// Set when the pass was aborted.
    pub failure: Option<PassFailure>,
}

impl PassReport {
    /// Report for a pass that could not run at all.
    pub fn aborted(error: RelayError) -> Self {
        Self {
            failure: Some(PassFailure {
                segment_id: None,
                error,
            }),
            ..Self::default()
        }
    }

    /// URL of the last segment uploaded in this pass.
    pub fn last_url(&self) -> Option<&str> {
        self.uploaded.last().map(|u| u.url.as_str())
    }

    /// True when every listed segment was uploaded.
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Upload every stored segment, oldest first.
///
/// A segment is deleted only after its upload returned a URL. The first
/// failure ends the pass so later segments never overtake an earlier,
/// unacknowledged one; the failed segment stays in the store for the next
/// pass. An empty store makes no uploader calls. Store access runs on the
/// blocking pool.
#[instrument(skip_all, fields(session = %session))]
pub async fn run_upload_pass(
    store: Arc<dyn SegmentStore>,
    uploader: &dyn Uploader,
    session: &SessionId,
) -> PassReport {
    let segments = match on_blocking_pool(&store, |store| store.list_all()).await {
        Ok(segments) => segments,
        Err(error) => {
            warn!(error = ?error, "Could not list stored segments");
            return PassReport::aborted(error);
        }
    };

    let mut report = PassReport {
        listed: segments.len(),
        ..PassReport::default()
    };

    if segments.is_empty() {
        debug!("No stored segments to upload");
        return report;
    }

    info!(count = segments.len(), "Upload pass started");

    for (index, segment) in segments.iter().enumerate() {
        let url = match uploader.upload(segment, session, index).await {
            Ok(url) => url,
            Err(error) => {
                warn!(segment_id = %segment.id, error = ?error, "Upload failed, aborting pass");
                report.failure = Some(PassFailure {
                    segment_id: Some(segment.id.clone()),
                    error,
                });
                return report;
            }
        };

        report.uploaded.push(UploadedSegment {
            segment_id: segment.id.clone(),
            url,
        });

        let id = segment.id.clone();
        if let Err(error) = on_blocking_pool(&store, move |store| store.delete_by_id(&id)).await {
            // Uploaded but still stored; the next pass sends it again.
            warn!(segment_id = %segment.id, error = ?error, "Uploaded segment could not be deleted");
            report.failure = Some(PassFailure {
                segment_id: Some(segment.id.clone()),
                error,
            });
            return report;
        }
    }

    info!(uploaded = report.uploaded.len(), "Upload pass complete");

    report
}

async fn on_blocking_pool<T, F>(store: &Arc<dyn SegmentStore>, op: F) -> CoreResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn SegmentStore) -> CoreResult<T> + Send + 'static,
{
    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || op(store.as_ref())).await {
        Ok(result) => result,
        Err(e) => Err(RelayError::storage(format!("Store task failed: {}", e))),
    }
}
