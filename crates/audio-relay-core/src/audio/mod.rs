pub(crate) mod capture;
mod format;
mod fragment;
mod resampler;
mod source;

pub(crate) use resampler::Resampler;

pub use {
    capture::AudioCapturer,
    format::{CaptureConstraints, DEFAULT_FRAGMENT_INTERVAL, DEFAULT_SAMPLE_RATE, PcmFormat},
    fragment::{CaptureEvent, Fragment},
    source::CaptureSource,
};
