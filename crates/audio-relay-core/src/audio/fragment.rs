use cpal::Sample;

/// One fixed-interval piece of captured audio, already encoded as s16le PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position within the capture session that produced it.
    pub sequence: u64,
    /// Encoded PCM bytes.
    pub pcm: Vec<u8>,
}

impl Fragment {
    /// Wrap already-encoded PCM bytes.
    pub fn new(sequence: u64, pcm: Vec<u8>) -> Self {
        Self { sequence, pcm }
    }

    /// Encode mono `f32` samples in `[-1.0, 1.0]` to s16le.
    pub fn from_samples(sequence: u64, samples: &[f32]) -> Self {
        let mut pcm = Vec::with_capacity(samples.len() * 2);
        for &sample in samples {
            let value = i16::from_sample(sample.clamp(-1.0, 1.0));
            pcm.extend_from_slice(&value.to_le_bytes());
        }
        Self { sequence, pcm }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.pcm.len()
    }

    /// True when the fragment carries no audio.
    pub fn is_empty(&self) -> bool {
        self.pcm.is_empty()
    }
}

/// Events pushed from the capture session to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A fragment of audio is available.
    Fragment(Fragment),
    /// Microphone access went away; the stream has ended.
    Revoked {
        /// Backend description of the revocation.
        reason: String,
    },
    /// Non-fatal stream fault; capture continues.
    Failed {
        /// Backend description of the fault.
        reason: String,
    },
}
