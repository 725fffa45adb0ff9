/// Commands sent from the hotkey handler and tray menu to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Start recording when idle, stop when recording.
    ToggleRecording,
    /// Upload everything stored locally.
    UploadNow,
    /// Ask for microphone access.
    RequestPermission,
    /// Open the most recent upload in the default browser.
    OpenLastUpload,
    /// Put the most recent upload URL on the clipboard.
    CopyLastUploadUrl,
    /// Request application shutdown.
    Shutdown,
}
