use crate::{ErrorKind, store::Segment, upload::UploadContainer};

const L16_MIME: &str = "audio/L16;rate=8000;channels=1";
const WAV_HEADER_LEN: usize = 44;

/// WHAT: WAV container adds a canonical 44-byte header around the PCM
/// WHY: Uploaded files must be playable without knowing the raw format
#[test]
#[allow(clippy::unwrap_used)]
fn given_pcm_segment_when_wrapped_in_wav_then_header_and_samples_present() {
    // Given: Four s16le samples
    let pcm = vec![1, 0, 2, 0, 3, 0, 4, 0];
    let segment = Segment::new(pcm.clone(), L16_MIME);

    // When: Encoding as WAV
    let encoded = UploadContainer::Wav.encode(&segment).unwrap();

    // Then: RIFF/WAVE header, 8000 Hz, PCM body unchanged
    assert_eq!(encoded.mime_type, "audio/wav");
    assert_eq!(encoded.extension, "wav");
    assert_eq!(encoded.bytes.len(), WAV_HEADER_LEN + pcm.len());
    assert_eq!(&encoded.bytes[0..4], b"RIFF");
    assert_eq!(&encoded.bytes[8..12], b"WAVE");
    assert_eq!(
        u32::from_le_bytes(encoded.bytes[24..28].try_into().unwrap()),
        8_000
    );
    assert_eq!(&encoded.bytes[WAV_HEADER_LEN..], pcm.as_slice());
}

/// WHAT: Raw container passes the payload through
/// WHY: The host receives exactly what was stored
#[test]
#[allow(clippy::unwrap_used)]
fn given_segment_when_encoded_raw_then_payload_unchanged() {
    let segment = Segment::new(vec![7, 7, 7, 7], L16_MIME);

    let encoded = UploadContainer::Raw.encode(&segment).unwrap();

    assert_eq!(encoded.bytes, segment.payload);
    assert_eq!(encoded.mime_type, L16_MIME);
    assert_eq!(encoded.extension, "pcm");
}

/// WHAT: WAV wrapping of a non-PCM payload fails
/// WHY: Wrapping compressed audio in a PCM header would corrupt it
#[test]
fn given_foreign_mime_when_wrapped_in_wav_then_upload_error() {
    let segment = Segment::new(vec![0; 16], "audio/webm;codecs=opus");

    let result = UploadContainer::Wav.encode(&segment);

    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Upload));
}

/// WHAT: Container names deserialize from lowercase config values
/// WHY: `container = "raw"` in the config file must select the raw container
#[test]
#[allow(clippy::unwrap_used)]
fn given_lowercase_name_when_deserialized_then_container_selected() {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        container: UploadContainer,
    }

    let parsed: Wrapper = toml::from_str("container = \"raw\"").unwrap();

    assert_eq!(parsed.container, UploadContainer::Raw);
}
