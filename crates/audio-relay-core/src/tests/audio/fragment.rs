use crate::audio::Fragment;

/// WHAT: Samples encode as clamped s16le
/// WHY: Payloads must be valid 16-bit PCM regardless of input overshoot
#[test]
fn given_samples_when_encoded_then_little_endian_i16_clamped() {
    // Given: Silence, full scale and overshoot
    let samples = [0.0f32, 1.0, -1.0, 2.0];

    // When: Encoding
    let fragment = Fragment::from_samples(7, &samples);

    // Then: Two bytes per sample, clamped, little endian
    assert_eq!(fragment.sequence, 7);
    assert_eq!(fragment.len(), 8);
    let values: Vec<i16> = fragment
        .pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();
    assert_eq!(values[0], 0);
    assert_eq!(values[1], i16::MAX);
    assert!(values[2] <= -i16::MAX);
    assert_eq!(values[3], values[1]);
}

/// WHAT: No samples means an empty fragment
/// WHY: Empty fragments are skipped by the buffer
#[test]
fn given_no_samples_when_encoded_then_empty() {
    assert!(Fragment::from_samples(0, &[]).is_empty());
}
