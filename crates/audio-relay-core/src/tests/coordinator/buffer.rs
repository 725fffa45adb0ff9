use crate::{
    audio::{CaptureConstraints, Fragment, PcmFormat},
    coordinator::buffer::FragmentBuffer,
};

fn format() -> PcmFormat {
    PcmFormat::from_constraints(&CaptureConstraints::default())
}

/// WHAT: Assembled segment is the concatenation of fragments in order
/// WHY: Segment payloads must be the exact recorded byte stream
#[test]
#[allow(clippy::unwrap_used)]
fn given_fragments_when_assembled_then_payload_concatenated_in_order() {
    // Given: Two buffered fragments
    let mut buffer = FragmentBuffer::new(10);
    buffer.push(Fragment::new(0, vec![1, 2]));
    buffer.push(Fragment::new(1, vec![3, 4, 5, 6]));

    // When: Assembling
    let segment = buffer.assemble(format()).unwrap();

    // Then: Bytes in arrival order, format recorded, buffer untouched
    assert_eq!(segment.payload, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(segment.mime_type, "audio/L16;rate=8000;channels=1");
    assert_eq!(buffer.len(), 2);
}

/// WHAT: An empty buffer assembles to nothing
/// WHY: Flushing an empty buffer must not create an empty segment
#[test]
fn given_empty_buffer_when_assembled_then_none() {
    // Given: An empty buffer
    let buffer = FragmentBuffer::new(10);

    // When/Then: Nothing to assemble
    assert!(buffer.assemble(format()).is_none());
}

/// WHAT: Empty fragments are not buffered
/// WHY: Zero-length deliveries carry no audio
#[test]
fn given_empty_fragment_when_pushed_then_ignored() {
    // Given: A buffer
    let mut buffer = FragmentBuffer::new(10);

    // When: Pushing an empty fragment
    buffer.push(Fragment::new(0, Vec::new()));

    // Then: Still empty
    assert!(buffer.is_empty());
}

/// WHAT: A full buffer drops the oldest fragment
/// WHY: Memory stays bounded while storage is unavailable
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_buffer_when_pushed_then_oldest_dropped() {
    // Given: A buffer holding its capacity
    let mut buffer = FragmentBuffer::new(2);
    buffer.push(Fragment::new(0, vec![0, 0]));
    buffer.push(Fragment::new(1, vec![1, 1]));

    // When: Pushing one more
    buffer.push(Fragment::new(2, vec![2, 2]));

    // Then: Newest two kept
    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.assemble(format()).unwrap().payload, vec![1, 1, 2, 2]);
}
