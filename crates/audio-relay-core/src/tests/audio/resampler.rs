use crate::audio::Resampler;

// Test constants
const INPUT_SAMPLE_RATE: u32 = 48000;
const OUTPUT_SAMPLE_RATE: u32 = 8000;
const ONE_SECOND_INPUT_SAMPLES: usize = INPUT_SAMPLE_RATE as usize;
const TWO_SECONDS_OUTPUT_SAMPLES: usize = 2 * OUTPUT_SAMPLE_RATE as usize;
const LENGTH_TOLERANCE: u64 = 400;
const TEST_SIGNAL_AMPLITUDE: f32 = 0.5;
const TONE_FREQUENCY_FACTOR: f32 = 0.05;
const MAX_AMPLITUDE: f32 = 1.5;
const SHORT_BLOCK: usize = 500;

/// WHAT: Streaming 48 kHz blocks yields about the right amount of 8 kHz audio
/// WHY: Fragments must cover their interval even when the device rate differs
#[test]
#[allow(clippy::unwrap_used)]
fn given_48khz_blocks_when_resampling_to_8khz_then_total_length_approximately_correct() {
    // Given: Resampler configured for 48kHz -> 8kHz and two one-second blocks
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let block = vec![TEST_SIGNAL_AMPLITUDE; ONE_SECOND_INPUT_SAMPLES];

    // When: Processing both blocks and flushing the tail
    let mut output = resampler.process(&block).unwrap();
    output.extend(resampler.process(&block).unwrap());
    output.extend(resampler.flush().unwrap());

    // Then: About two seconds at 8kHz, all finite
    assert!(
        (output.len() as i64 - TWO_SECONDS_OUTPUT_SAMPLES as i64).unsigned_abs() < LENGTH_TOLERANCE,
        "Expected ~{} samples, got {}",
        TWO_SECONDS_OUTPUT_SAMPLES,
        output.len()
    );
    assert!(output.iter().all(|&s| s.is_finite()));
}

/// WHAT: Input shorter than one chunk is carried, not padded
/// WHY: Fragment boundaries must not inject silence mid-recording
#[test]
#[allow(clippy::unwrap_used)]
fn given_short_block_when_processing_then_output_deferred_until_flush() {
    // Given: A resampler and a block smaller than its chunk size
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let block = vec![TEST_SIGNAL_AMPLITUDE; SHORT_BLOCK];

    // When: Processing it
    let output = resampler.process(&block).unwrap();

    // Then: Nothing yet; flush drains at most the proportional length
    assert!(output.is_empty());
    let tail = resampler.flush().unwrap();
    assert!(tail.len() <= SHORT_BLOCK * OUTPUT_SAMPLE_RATE as usize / INPUT_SAMPLE_RATE as usize);
}

/// WHAT: Flushing with nothing carried returns empty output
/// WHY: Stop without a partial block must not emit a stray fragment
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_carry_when_flushing_then_empty_output() {
    // Given: A fresh resampler
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();

    // When: Flushing
    let output = resampler.flush().unwrap();

    // Then: Empty
    assert!(output.is_empty());
}

/// WHAT: Resampling keeps a tone within range
/// WHY: Validates that audio quality is maintained through resampling
#[test]
#[allow(clippy::unwrap_used)]
fn given_tone_signal_when_resampling_then_output_stays_bounded() {
    // Given: A resampler and a tone
    let mut resampler = Resampler::new(INPUT_SAMPLE_RATE, OUTPUT_SAMPLE_RATE).unwrap();
    let input: Vec<f32> = (0..ONE_SECOND_INPUT_SAMPLES)
        .map(|i| (i as f32 * TONE_FREQUENCY_FACTOR).sin())
        .collect();

    // When: Processing the tone
    let output = resampler.process(&input).unwrap();

    // Then: Non-empty and bounded
    assert!(!output.is_empty());
    assert!(
        output
            .iter()
            .all(|&s| s.is_finite() && s.abs() <= MAX_AMPLITUDE)
    );
}
