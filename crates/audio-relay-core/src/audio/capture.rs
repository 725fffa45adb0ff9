use crate::{
    CoreResult, RelayError,
    audio::{CaptureConstraints, CaptureEvent, CaptureSource, Fragment, PcmFormat, Resampler},
};

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
        mpsc as std_mpsc,
    },
    thread::JoinHandle,
};

use cpal::{
    BuildStreamError, Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig,
    StreamError, SupportedStreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, instrument, warn};

/// Backend error fragments that indicate the OS refused microphone access.
const PERMISSION_MARKERS: [&str; 4] = ["permission", "denied", "not authorized", "access"];

/// Device configuration chosen for a capture session.
pub(crate) struct NegotiatedConfig {
    pub(crate) config: StreamConfig,
    pub(crate) sample_format: SampleFormat,
    /// True when the device delivers the target rate and channel count as-is.
    pub(crate) native: bool,
}

struct ActiveCapture {
    stream: Stream,
    /// Set before dropping the stream so an in-flight callback stops writing.
    shutdown: Arc<AtomicBool>,
    /// Mono samples captured since the last whole fragment was cut.
    pending: Arc<Mutex<Vec<f32>>>,
    raw_tx: std_mpsc::Sender<Vec<f32>>,
    pump: JoinHandle<()>,
}

/// Microphone capture on the default cpal input device.
///
/// The realtime callback downmixes to mono and cuts blocks of one fragment
/// interval. A dedicated pump thread resamples those blocks to the target
/// rate when needed, encodes them as s16le and forwards them as
/// [`CaptureEvent::Fragment`].
#[derive(Default)]
pub struct AudioCapturer {
    active: Option<ActiveCapture>,
}

impl AudioCapturer {
    /// Create an idle capturer. The device is resolved when recording starts.
    pub fn new() -> Self {
        Self::default()
    }

    #[track_caller]
    fn default_device() -> CoreResult<Device> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| RelayError::device("No microphone found"))
    }
}

impl CaptureSource for AudioCapturer {
    #[track_caller]
    #[instrument(skip(self, events))]
    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        events: UnboundedSender<CaptureEvent>,
    ) -> CoreResult<PcmFormat> {
        if self.active.is_some() {
            warn!("Capture already active, restarting");
            self.stop();
        }

        let device = Self::default_device()?;
        let negotiated = negotiate(&device, constraints)?;
        let input_rate = negotiated.config.sample_rate;
        let format = PcmFormat::from_constraints(constraints);

        let resampler = if input_rate == constraints.sample_rate {
            None
        } else {
            Some(Resampler::new(input_rate, constraints.sample_rate)?)
        };

        info!(
            device_id = ?device.id(),
            input_rate,
            input_channels = negotiated.config.channels,
            sample_format = ?negotiated.sample_format,
            native = negotiated.native,
            target_rate = constraints.sample_rate,
            "Capture format negotiated"
        );

        let shutdown = Arc::new(AtomicBool::new(false));
        let pending = Arc::new(Mutex::new(Vec::new()));
        let (raw_tx, raw_rx) = std_mpsc::channel();

        let pump = spawn_fragment_pump(raw_rx, resampler, events.clone())?;

        let block = BlockCutter {
            channels: usize::from(negotiated.config.channels.max(1)),
            block_frames: constraints.frames_per_fragment(input_rate),
            shutdown: Arc::clone(&shutdown),
            pending: Arc::clone(&pending),
            raw_tx: raw_tx.clone(),
        };

        let stream = match negotiated.sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &negotiated.config, block, events),
            SampleFormat::I16 => build_stream::<i16>(&device, &negotiated.config, block, events),
            SampleFormat::U16 => build_stream::<u16>(&device, &negotiated.config, block, events),
            other => Err(RelayError::device(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }?;

        stream.play().map_err(|e| {
            let reason = format!("Failed to start stream: {}", e);
            classify(reason)
        })?;

        self.active = Some(ActiveCapture {
            stream,
            shutdown,
            pending,
            raw_tx,
            pump,
        });

        info!("Audio capture started");

        Ok(format)
    }

    #[instrument(skip(self))]
    fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let ActiveCapture {
            stream,
            shutdown,
            pending,
            raw_tx,
            pump,
        } = active;

        shutdown.store(true, Ordering::Release);
        drop(stream);

        // The stream callback is gone; whatever it left behind is the
        // trailing partial fragment.
        let tail = std::mem::take(&mut *pending.lock().unwrap_or_else(|e| {
            error!("Pending sample lock poisoned, recovering: {}", e);
            e.into_inner()
        }));
        if !tail.is_empty() {
            debug!(tail_len = tail.len(), "Forwarding trailing partial fragment");
            let _ = raw_tx.send(tail);
        }
        drop(raw_tx);

        if pump.join().is_err() {
            error!("Fragment pump thread panicked");
        }

        info!("Audio capture stopped");
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn request_permission(&mut self) -> CoreResult<()> {
        let device = Self::default_device()?;
        let config = device.default_input_config().map_err(|e| {
            let reason = format!("Failed to get config: {}", e);
            classify(reason)
        })?;

        let stream = match config.sample_format() {
            SampleFormat::F32 => build_probe::<f32>(&device, &config.config()),
            SampleFormat::I16 => build_probe::<i16>(&device, &config.config()),
            SampleFormat::U16 => build_probe::<u16>(&device, &config.config()),
            other => Err(RelayError::device(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }?;

        stream.play().map_err(|e| {
            let reason = format!("Failed to start probe stream: {}", e);
            classify(reason)
        })?;
        drop(stream);

        info!("Microphone access confirmed");

        Ok(())
    }

    fn is_active(&self) -> bool {
        self.active.is_some()
    }
}

impl Drop for AudioCapturer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State moved into the realtime callback.
struct BlockCutter {
    channels: usize,
    block_frames: usize,
    shutdown: Arc<AtomicBool>,
    pending: Arc<Mutex<Vec<f32>>>,
    raw_tx: std_mpsc::Sender<Vec<f32>>,
}

impl BlockCutter {
    fn push<T>(&self, data: &[T])
    where
        T: Sample,
        f32: FromSample<T>,
    {
        if self.shutdown.load(Ordering::Acquire) {
            return;
        }

        let mut buf = self.pending.lock().unwrap_or_else(|e| {
            error!("Pending sample lock poisoned, recovering: {}", e);
            e.into_inner()
        });

        for frame in data.chunks(self.channels) {
            let sum: f32 = frame.iter().map(|&s| f32::from_sample(s)).sum();
            buf.push(sum / frame.len() as f32);
        }

        while buf.len() >= self.block_frames {
            let rest = buf.split_off(self.block_frames);
            let block = std::mem::replace(&mut *buf, rest);
            if self.raw_tx.send(block).is_err() {
                return;
            }
        }
    }
}

/// Pick a device configuration: the target rate and channel count when the
/// device supports it, otherwise the device default (downmixed and resampled
/// downstream).
#[track_caller]
pub(crate) fn negotiate(
    device: &Device,
    constraints: &CaptureConstraints,
) -> CoreResult<NegotiatedConfig> {
    match device.supported_input_configs() {
        Ok(ranges) => {
            let preferred = ranges
                .filter(|range| range.channels() == constraints.channels)
                .filter(|range| is_supported_format(range.sample_format()))
                .find(|range| {
                    range.min_sample_rate() <= constraints.sample_rate
                        && constraints.sample_rate <= range.max_sample_rate()
                });
            if let Some(range) = preferred {
                return Ok(from_supported(range.with_sample_rate(constraints.sample_rate), true));
            }
        }
        Err(e) => warn!("Failed to enumerate input configs: {}", e),
    }

    let fallback = device.default_input_config().map_err(|e| {
        let reason = format!("Failed to get config: {}", e);
        classify(reason)
    })?;

    info!(
        sample_rate = fallback.sample_rate(),
        channels = fallback.channels(),
        "Preferred capture format unsupported, using device default"
    );

    Ok(from_supported(fallback, false))
}

fn from_supported(supported: SupportedStreamConfig, native: bool) -> NegotiatedConfig {
    NegotiatedConfig {
        sample_format: supported.sample_format(),
        config: supported.config(),
        native,
    }
}

fn is_supported_format(format: SampleFormat) -> bool {
    matches!(format, SampleFormat::F32 | SampleFormat::I16 | SampleFormat::U16)
}

#[track_caller]
fn build_stream<T>(
    device: &Device,
    config: &StreamConfig,
    cutter: BlockCutter,
    events: UnboundedSender<CaptureEvent>,
) -> CoreResult<Stream>
where
    T: SizedSample + Send + 'static,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| cutter.push(data),
            move |err| {
                let event = stream_error_event(err);
                error!(event = ?event, "Audio stream error");
                let _ = events.send(event);
            },
            None,
        )
        .map_err(classify_build_error)
}

#[track_caller]
fn build_probe<T>(device: &Device, config: &StreamConfig) -> CoreResult<Stream>
where
    T: SizedSample + Send + 'static,
{
    device
        .build_input_stream(
            config,
            |_: &[T], _: &cpal::InputCallbackInfo| {},
            |err| warn!("Permission probe stream error: {}", err),
            None,
        )
        .map_err(classify_build_error)
}

/// Losing the device mid-session is how revoked microphone access surfaces.
pub(crate) fn stream_error_event(err: StreamError) -> CaptureEvent {
    match err {
        StreamError::DeviceNotAvailable => CaptureEvent::Revoked {
            reason: "Input device is no longer available".to_string(),
        },
        other => CaptureEvent::Failed {
            reason: other.to_string(),
        },
    }
}

#[track_caller]
fn spawn_fragment_pump(
    raw_rx: std_mpsc::Receiver<Vec<f32>>,
    mut resampler: Option<Resampler>,
    events: UnboundedSender<CaptureEvent>,
) -> CoreResult<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("fragment-pump".to_string())
        .spawn(move || {
            let mut sequence = 0u64;
            let mut emit = |samples: Vec<f32>| -> bool {
                if samples.is_empty() {
                    return true;
                }
                let fragment = Fragment::from_samples(sequence, &samples);
                sequence += 1;
                events.send(CaptureEvent::Fragment(fragment)).is_ok()
            };

            while let Ok(block) = raw_rx.recv() {
                let samples = match resampler.as_mut() {
                    Some(r) => match r.process(&block) {
                        Ok(samples) => samples,
                        Err(e) => {
                            error!(error = ?e, "Dropping block that failed to resample");
                            continue;
                        }
                    },
                    None => block,
                };
                if !emit(samples) {
                    debug!("Capture event receiver closed, stopping pump");
                    return;
                }
            }

            if let Some(r) = resampler.as_mut() {
                match r.flush() {
                    Ok(tail) => {
                        let _ = emit(tail);
                    }
                    Err(e) => error!(error = ?e, "Failed to flush resampler tail"),
                }
            }
        })
        .map_err(|e| RelayError::device(format!("Failed to spawn fragment pump: {}", e)))
}

#[track_caller]
fn classify_build_error(err: BuildStreamError) -> RelayError {
    match err {
        BuildStreamError::DeviceNotAvailable => {
            RelayError::device("Input device is not available")
        }
        other => classify(format!("Failed to build stream: {}", other)),
    }
}

/// Backends do not expose a typed permission error; read it off the text.
#[track_caller]
pub(crate) fn classify(reason: String) -> RelayError {
    let lowered = reason.to_lowercase();
    if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
        RelayError::permission(reason)
    } else {
        RelayError::device(reason)
    }
}
