use std::time::Duration;

/// Lowest practical sample rate for conversational speech.
pub const DEFAULT_SAMPLE_RATE: u32 = 8_000;

/// Fixed cadence at which the capture session delivers fragments.
pub const DEFAULT_FRAGMENT_INTERVAL: Duration = Duration::from_secs(1);

const L16_MIME: &str = "audio/L16";

/// What the coordinator asks the capture session for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConstraints {
    /// Target sample rate of emitted fragments.
    pub sample_rate: u32,
    /// Target channel count of emitted fragments.
    pub channels: u16,
    /// Time covered by one fragment.
    pub fragment_interval: Duration,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            fragment_interval: DEFAULT_FRAGMENT_INTERVAL,
        }
    }
}

impl CaptureConstraints {
    /// Samples per channel in one fragment at the given rate.
    pub fn frames_per_fragment(&self, rate: u32) -> usize {
        let frames = u128::from(rate) * self.fragment_interval.as_millis() / 1000;
        usize::try_from(frames).unwrap_or(usize::MAX).max(1)
    }
}

/// Signed 16-bit little-endian PCM layout of fragment and segment payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    /// Samples per second.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
}

impl PcmFormat {
    /// Bytes per sample.
    pub const BYTES_PER_SAMPLE: usize = 2;

    /// PCM format matching the constraints.
    pub fn from_constraints(constraints: &CaptureConstraints) -> Self {
        Self {
            sample_rate: constraints.sample_rate,
            channels: constraints.channels,
        }
    }

    /// RFC 2586 style mime type, e.g. `audio/L16;rate=8000;channels=1`.
    pub fn mime_type(&self) -> String {
        format!(
            "{};rate={};channels={}",
            L16_MIME, self.sample_rate, self.channels
        )
    }

    /// Parse a mime type produced by [`PcmFormat::mime_type`].
    ///
    /// Returns `None` for anything other than `audio/L16` with a rate.
    pub fn parse_mime(mime: &str) -> Option<Self> {
        let mut parts = mime.split(';').map(str::trim);
        if !parts.next()?.eq_ignore_ascii_case(L16_MIME) {
            return None;
        }

        let mut sample_rate = None;
        let mut channels = 1;
        for param in parts {
            let (key, value) = param.split_once('=')?;
            match key.trim() {
                "rate" => sample_rate = value.trim().parse().ok(),
                "channels" => channels = value.trim().parse().ok()?,
                _ => {}
            }
        }

        Some(Self {
            sample_rate: sample_rate?,
            channels,
        })
    }
}
