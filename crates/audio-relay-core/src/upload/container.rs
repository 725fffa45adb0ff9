use crate::{CoreResult, RelayError, audio::PcmFormat, store::Segment};

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// File container the segment payload is wrapped in before upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadContainer {
    /// RIFF/WAVE around the PCM payload.
    #[default]
    Wav,
    /// Payload as stored.
    Raw,
}

/// Bytes, mime type and file extension ready for the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedUpload {
    /// File body.
    pub bytes: Vec<u8>,
    /// Content type of the file part.
    pub mime_type: String,
    /// Extension appended to the object name.
    pub extension: &'static str,
}

impl UploadContainer {
    /// Encode `segment` for upload.
    ///
    /// # Errors
    ///
    /// [`RelayError::UploadError`] when a WAV container is requested for a
    /// payload that is not s16le PCM.
    #[track_caller]
    pub fn encode(self, segment: &Segment) -> CoreResult<EncodedUpload> {
        match self {
            UploadContainer::Raw => Ok(EncodedUpload {
                bytes: segment.payload.clone(),
                mime_type: segment.mime_type.clone(),
                extension: "pcm",
            }),
            UploadContainer::Wav => {
                let format = segment.pcm_format().ok_or_else(|| {
                    RelayError::upload(format!(
                        "Cannot wrap {} payload in WAV",
                        segment.mime_type
                    ))
                })?;
                Ok(EncodedUpload {
                    bytes: wav_bytes(&segment.payload, format)?,
                    mime_type: "audio/wav".to_string(),
                    extension: "wav",
                })
            }
        }
    }
}

#[track_caller]
fn wav_bytes(pcm: &[u8], format: PcmFormat) -> CoreResult<Vec<u8>> {
    let spec = WavSpec {
        channels: format.channels,
        sample_rate: format.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(pcm.len() + 44));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)
            .map_err(|e| RelayError::upload(format!("Failed to start WAV container: {}", e)))?;

        for bytes in pcm.chunks_exact(PcmFormat::BYTES_PER_SAMPLE) {
            writer
                .write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))
                .map_err(|e| RelayError::upload(format!("Failed to write WAV sample: {}", e)))?;
        }

        writer
            .finalize()
            .map_err(|e| RelayError::upload(format!("Failed to finalize WAV container: {}", e)))?;
    }

    let bytes = cursor.into_inner();
    debug!(pcm_len = pcm.len(), wav_len = bytes.len(), "Wrapped segment in WAV");

    Ok(bytes)
}
