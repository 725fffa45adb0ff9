use crate::audio::{Fragment, PcmFormat};

use chrono::Utc;
use uuid::Uuid;

/// One buffered unit of recorded audio, persisted locally until uploaded.
///
/// Immutable once created. `payload` is the concatenation of the fragments
/// that were buffered when the segment was flushed, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Opaque store key.
    pub id: String,
    /// Encoded audio bytes.
    pub payload: Vec<u8>,
    /// Mime type describing `payload`.
    pub mime_type: String,
    /// Unix milliseconds at flush time.
    pub created_at_ms: i64,
}

impl Segment {
    /// Create a segment with a fresh id.
    pub fn new(payload: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            mime_type: mime_type.into(),
            created_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Assemble buffered fragments into a segment.
    ///
    /// Returns `None` when there is nothing to flush.
    pub fn from_fragments<'a, I>(fragments: I, format: PcmFormat) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Fragment>,
    {
        let payload: Vec<u8> = fragments
            .into_iter()
            .flat_map(|f| f.pcm.iter().copied())
            .collect();

        if payload.is_empty() {
            return None;
        }

        Some(Self::new(payload, format.mime_type()))
    }

    /// PCM layout of the payload, when the mime type describes one.
    pub fn pcm_format(&self) -> Option<PcmFormat> {
        PcmFormat::parse_mime(&self.mime_type)
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// True when the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}
