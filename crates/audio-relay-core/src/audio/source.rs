use crate::{
    CoreResult,
    audio::{CaptureConstraints, CaptureEvent, PcmFormat},
};

use tokio::sync::mpsc::UnboundedSender;

/// Platform audio capture as seen by the coordinator.
///
/// Implementations push [`CaptureEvent`]s on the sender handed to
/// [`CaptureSource::start`] and must never block the caller for longer than
/// it takes to open or close a device.
pub trait CaptureSource: Send {
    /// Open the input device and begin delivering fragments.
    ///
    /// # Errors
    ///
    /// [`crate::RelayError::PermissionDenied`] when microphone access is
    /// refused, [`crate::RelayError::DeviceError`] when no usable device or
    /// stream could be opened.
    fn start(
        &mut self,
        constraints: &CaptureConstraints,
        events: UnboundedSender<CaptureEvent>,
    ) -> CoreResult<PcmFormat>;

    /// Stop capture. Any partial fragment is delivered before this returns.
    /// No-op when no session is active.
    fn stop(&mut self);

    /// Probe microphone access without recording.
    fn request_permission(&mut self) -> CoreResult<()>;

    /// True while a capture session is open.
    fn is_active(&self) -> bool;
}
