use crate::{CoreResult, RelayError};

use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{Fft, FixedSync, Resampler as RubatoResampler};
use tracing::{debug, instrument};

const CHUNK_SIZE: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Streaming mono resampler used when the device cannot deliver the target
/// rate natively.
///
/// Input arrives in arbitrary block sizes (one fragment interval at a time).
/// Only whole FFT chunks are processed; the remainder carries over to the
/// next call so fragment boundaries never introduce zero padding. Call
/// [`Resampler::flush`] once at the end of capture to drain the tail.
pub struct Resampler {
    resampler: Fft<f32>,
    input_rate: u32,
    output_rate: u32,
    carry: Vec<f32>,
}

impl Resampler {
    #[track_caller]
    #[instrument]
    pub fn new(input_rate: u32, output_rate: u32) -> CoreResult<Self> {
        let resampler = Fft::<f32>::new(
            input_rate as usize,
            output_rate as usize,
            CHUNK_SIZE,
            SUB_CHUNKS,
            1,
            FixedSync::Input,
        )
        .map_err(|e| RelayError::resampling(format!("Failed to create resampler: {}", e)))?;

        debug!(input_rate, output_rate, "Resampler initialized");

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            carry: Vec::with_capacity(CHUNK_SIZE * 2),
        })
    }

    /// Resample as many whole chunks as `samples` (plus carry-over) allows.
    #[track_caller]
    #[instrument(skip(self, samples))]
    pub fn process(&mut self, samples: &[f32]) -> CoreResult<Vec<f32>> {
        self.carry.extend_from_slice(samples);

        let whole = self.carry.len() / CHUNK_SIZE * CHUNK_SIZE;
        if whole == 0 {
            return Ok(Vec::new());
        }

        let pending: Vec<f32> = self.carry.drain(..whole).collect();
        let mut output = Vec::with_capacity(self.estimated_len(pending.len()));
        for chunk in pending.chunks_exact(CHUNK_SIZE) {
            self.process_chunk(chunk, &mut output)?;
        }

        Ok(output)
    }

    /// Pad and resample whatever is left in the carry-over buffer.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn flush(&mut self) -> CoreResult<Vec<f32>> {
        if self.carry.is_empty() {
            return Ok(Vec::new());
        }

        let real_len = self.carry.len();
        let mut chunk = std::mem::take(&mut self.carry);
        chunk.resize(CHUNK_SIZE, 0.0);

        let mut output = Vec::with_capacity(self.estimated_len(CHUNK_SIZE));
        self.process_chunk(&chunk, &mut output)?;
        output.truncate(self.estimated_len(real_len));

        debug!(
            tail_len = real_len,
            output_len = output.len(),
            "Resampler flushed"
        );

        Ok(output)
    }

    fn estimated_len(&self, input_len: usize) -> usize {
        (input_len as f64 * f64::from(self.output_rate) / f64::from(self.input_rate)) as usize
    }

    #[track_caller]
    fn process_chunk(&mut self, chunk: &[f32], output: &mut Vec<f32>) -> CoreResult<()> {
        let input_adapter = InterleavedSlice::new(chunk, 1, CHUNK_SIZE).map_err(|e| {
            RelayError::resampling(format!("Failed to create input adapter: {}", e))
        })?;

        let output_frames = self.resampler.output_frames_max();
        let mut output_chunk = vec![0.0f32; output_frames];

        let mut output_adapter = InterleavedSlice::new_mut(&mut output_chunk, 1, output_frames)
            .map_err(|e| {
                RelayError::resampling(format!("Failed to create output adapter: {}", e))
            })?;

        let (_input_frames, written) = self
            .resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| RelayError::resampling(format!("Resampling failed: {}", e)))?;

        output.extend_from_slice(&output_chunk[..written]);
        Ok(())
    }
}
