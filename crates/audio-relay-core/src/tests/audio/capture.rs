use crate::{
    AudioCapturer, CaptureConstraints, CaptureEvent, CaptureSource, ErrorKind,
    audio::capture::{classify, stream_error_event},
};

use std::time::Duration;

use cpal::{BackendSpecificError, StreamError};

/// WHAT: Backend errors mentioning permission are classified as denials
/// WHY: The coordinator only persists Denied for permission failures
#[test]
fn given_permission_text_when_classified_then_permission_error() {
    // Given: Typical backend wording for refused access
    let reasons = [
        "Permission denied by user",
        "Microphone access not authorized",
        "AUDCLNT_E_DEVICE_IN_USE: access is denied",
    ];

    // When/Then: Each classifies as a permission error
    for reason in reasons {
        assert_eq!(classify(reason.to_string()).kind(), ErrorKind::Permission, "{reason}");
    }
}

/// WHAT: Other backend errors are device errors
/// WHY: A missing or busy device must not flip the permission state
#[test]
fn given_device_text_when_classified_then_device_error() {
    // Given: A driver failure unrelated to permission
    let reason = "ALSA function 'snd_pcm_open' failed with error 'No such device'";

    // When: Classifying
    let error = classify(reason.to_string());

    // Then: Device error with the reason preserved
    assert_eq!(error.kind(), ErrorKind::Device);
    assert_eq!(error.reason(), reason);
}

/// WHAT: Losing the device mid-stream is reported as revocation
/// WHY: Revoked microphone access surfaces as a vanished input device
#[test]
fn given_device_not_available_when_stream_errors_then_revoked_event() {
    // When: Mapping a device-not-available stream error
    let event = stream_error_event(StreamError::DeviceNotAvailable);

    // Then: Revocation
    assert!(matches!(event, CaptureEvent::Revoked { .. }));
}

/// WHAT: Backend-specific stream errors are non-fatal faults
/// WHY: Transient glitches keep the session recording
#[test]
fn given_backend_error_when_stream_errors_then_failed_event() {
    // When: Mapping a backend-specific stream error
    let event = stream_error_event(StreamError::BackendSpecific {
        err: BackendSpecificError {
            description: "buffer overrun".to_string(),
        },
    });

    // Then: Failed with the backend description
    match event {
        CaptureEvent::Failed { reason } => assert!(reason.contains("buffer overrun")),
        other => unreachable!("expected Failed, got {:?}", other),
    }
}

/// WHAT: A fresh capturer is inactive and stop is a no-op
/// WHY: Stop may be called from any state
#[test]
fn given_new_capturer_when_stopped_then_still_inactive() {
    // Given: A capturer that never started
    let mut capturer = AudioCapturer::new();

    // When: Stopping
    capturer.stop();

    // Then: Inactive
    assert!(!capturer.is_active());
}

/// WHAT: Live capture delivers 8 kHz s16le fragments
/// WHY: End-to-end check of negotiation, resampling and fragment cutting
#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
#[allow(clippy::unwrap_used)]
async fn given_default_microphone_when_capturing_then_fragments_delivered() {
    // Given: A capturer on the default device
    let mut capturer = AudioCapturer::new();
    let constraints = CaptureConstraints::default();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    // When: Capturing for a little over one fragment interval
    let format = capturer.start(&constraints, tx).unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;
    capturer.stop();

    // Then: At least one full fragment at the target format
    assert_eq!(format.sample_rate, 8_000);
    let mut fragments = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CaptureEvent::Fragment(fragment) = event {
            fragments.push(fragment);
        }
    }
    assert!(!fragments.is_empty());
    assert!(fragments.iter().all(|f| f.len() % 2 == 0));
}
