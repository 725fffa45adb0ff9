use crate::PermissionState;

/// Commands accepted by the coordinator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorCommand {
    /// Begin capturing.
    StartRecording,
    /// Stop capturing, flush and upload.
    StopRecording,
    /// Start when idle, stop when recording.
    ToggleRecording,
    /// Upload everything currently stored.
    UploadNow,
    /// Probe microphone access.
    RequestPermission,
    /// An embedding host reported a permission change. The desktop capture
    /// path reports revocation as [`crate::CaptureEvent::Revoked`] instead.
    PermissionChanged(PermissionState),
    /// Stop recording if needed, wait for the in-flight upload, exit.
    Shutdown,
}
