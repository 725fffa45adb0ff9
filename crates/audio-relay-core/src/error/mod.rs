use std::{fmt, panic::Location};

use error_location::ErrorLocation;
use thiserror::Error;

/// Recording, storage and upload errors with source location tracking.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Microphone access was denied or revoked.
    #[error("Microphone permission denied: {reason} {location}")]
    PermissionDenied {
        /// Description of the denial.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio device could not be opened or started.
    #[error("Audio device error: {reason} {location}")]
    DeviceError {
        /// Description of the device error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Local segment persistence is unavailable or an operation failed.
    #[error("Storage error: {reason} {location}")]
    StorageError {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Network, HTTP or response-shape failure while uploading a segment.
    #[error("Upload failed: {reason} {location}")]
    UploadError {
        /// Description of the upload failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Audio resampling failed.
    #[error("Resampling error: {reason} {location}")]
    ResamplingError {
        /// Description of the resampling error.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

/// Coarse error category used by the coordinator to pick a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Capture denied or revoked.
    Permission,
    /// Capture could not start or the stream faulted.
    Device,
    /// Local persistence failed.
    Storage,
    /// Remote upload failed.
    Upload,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Permission => "Microphone permission denied",
            ErrorKind::Device => "Audio device error",
            ErrorKind::Storage => "Local storage unavailable",
            ErrorKind::Upload => "Upload failed",
        };
        f.write_str(label)
    }
}

impl RelayError {
    /// Record a permission denial at the caller's location.
    #[track_caller]
    pub fn permission(reason: impl Into<String>) -> Self {
        RelayError::PermissionDenied {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Record a device failure at the caller's location.
    #[track_caller]
    pub fn device(reason: impl Into<String>) -> Self {
        RelayError::DeviceError {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Record a storage failure at the caller's location.
    #[track_caller]
    pub fn storage(reason: impl Into<String>) -> Self {
        RelayError::StorageError {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Record an upload failure at the caller's location.
    #[track_caller]
    pub fn upload(reason: impl Into<String>) -> Self {
        RelayError::UploadError {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Record a resampling failure at the caller's location.
    #[track_caller]
    pub fn resampling(reason: impl Into<String>) -> Self {
        RelayError::ResamplingError {
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::PermissionDenied { .. } => ErrorKind::Permission,
            RelayError::DeviceError { .. } | RelayError::ResamplingError { .. } => {
                ErrorKind::Device
            }
            RelayError::StorageError { .. } => ErrorKind::Storage,
            RelayError::UploadError { .. } => ErrorKind::Upload,
        }
    }

    /// Human-readable reason without the source location.
    pub fn reason(&self) -> &str {
        match self {
            RelayError::PermissionDenied { reason, .. }
            | RelayError::DeviceError { reason, .. }
            | RelayError::StorageError { reason, .. }
            | RelayError::UploadError { reason, .. }
            | RelayError::ResamplingError { reason, .. } => reason,
        }
    }

    /// Status line suitable for the presentation layer.
    pub fn status_text(&self) -> String {
        format!("{}: {}", self.kind(), self.reason())
    }
}

/// Result type alias using [`RelayError`].
pub type Result<T> = std::result::Result<T, RelayError>;
