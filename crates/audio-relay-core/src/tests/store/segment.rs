use crate::{
    audio::{Fragment, PcmFormat},
    store::Segment,
};

/// WHAT: Fragments assemble into one segment with the format's mime type
/// WHY: The payload must equal the recorded byte stream
#[test]
#[allow(clippy::unwrap_used)]
fn given_fragments_when_assembled_then_concatenated_with_mime() {
    // Given: Two fragments at 8 kHz mono
    let format = PcmFormat {
        sample_rate: 8_000,
        channels: 1,
    };
    let fragments = vec![Fragment::new(0, vec![1, 0]), Fragment::new(1, vec![2, 0])];

    // When: Assembling
    let segment = Segment::from_fragments(&fragments, format).unwrap();

    // Then: Concatenated payload and parseable format
    assert_eq!(segment.payload, vec![1, 0, 2, 0]);
    assert_eq!(segment.pcm_format(), Some(format));
    assert!(!segment.id.is_empty());
}

/// WHAT: Fresh segments get distinct ids
/// WHY: Ids are store keys
#[test]
fn given_two_segments_when_created_then_ids_differ() {
    let a = Segment::new(vec![1], "audio/L16;rate=8000;channels=1");
    let b = Segment::new(vec![1], "audio/L16;rate=8000;channels=1");
    assert_ne!(a.id, b.id);
}
