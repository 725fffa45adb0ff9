//! Audio-relay Core Library
//!
//! Continuous microphone capture with local durability and periodic upload,
//! built on CPAL, Rubato and an unsigned Cloudinary raw upload.
//!
//! Audio is cut into fixed-length PCM fragments, buffered in memory and
//! flushed into segments on a timer. Every segment is written to a local
//! [`SegmentStore`] before upload and deleted only once the host returned a
//! URL for it, so a crash or a failed request never loses recorded audio.
//!
//! # Example
//!
//! ```no_run
//! use audio_relay_core::{
//!     AudioCapturer, CloudinarySettings, CloudinaryUploader, Coordinator, CoordinatorCommand,
//!     CoordinatorSettings, CoreResult, DEFAULT_API_BASE, FilePermissionStore, FileSegmentStore,
//!     UploadContainer,
//! };
//!
//! use std::{sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let store = Arc::new(FileSegmentStore::open("segments")?);
//!     let uploader = Arc::new(CloudinaryUploader::new(CloudinarySettings {
//!         cloud_name: "demo".to_string(),
//!         upload_preset: "unsigned_audio".to_string(),
//!         api_base: DEFAULT_API_BASE.to_string(),
//!         container: UploadContainer::Wav,
//!         request_timeout: Duration::from_secs(120),
//!     })?);
//!
//!     let coordinator = Coordinator::new(
//!         Box::new(AudioCapturer::new()),
//!         store,
//!         uploader,
//!         Box::new(FilePermissionStore::new("permission.toml")),
//!         CoordinatorSettings::default(),
//!     );
//!
//!     let (commands, rx) = tokio::sync::mpsc::channel(16);
//!     let task = tokio::spawn(coordinator.run(rx));
//!
//!     let _ = commands.send(CoordinatorCommand::StartRecording).await;
//!     tokio::time::sleep(Duration::from_secs(90)).await;
//!     let _ = commands.send(CoordinatorCommand::Shutdown).await;
//!     let _ = task.await;
//!     Ok(())
//! }
//! ```

mod audio;
mod coordinator;
mod error;
mod permission;
mod session;
mod store;
mod upload;

pub use {
    audio::{
        AudioCapturer, CaptureConstraints, CaptureEvent, CaptureSource, DEFAULT_FRAGMENT_INTERVAL,
        DEFAULT_SAMPLE_RATE, Fragment, PcmFormat,
    },
    coordinator::{
        Coordinator, CoordinatorCommand, CoordinatorSettings, CoordinatorStatus,
        DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_BUFFERED_FRAGMENTS, DIAGNOSTIC_CAPACITY,
        DiagnosticEntry, DiagnosticLevel, DiagnosticLog, PassFailure, PassReport, RecordingState,
        UploadedSegment, run_upload_pass,
    },
    error::{ErrorKind, RelayError, Result as CoreResult},
    permission::{FilePermissionStore, MemoryPermissionStore, PermissionState, PermissionStore},
    session::SessionId,
    store::{FileSegmentStore, MemorySegmentStore, Segment, SegmentStore},
    upload::{
        CloudinarySettings, CloudinaryUploader, DEFAULT_API_BASE, EncodedUpload, UploadContainer,
        Uploader, object_name, upload_endpoint,
    },
};

#[cfg(test)]
mod tests;
