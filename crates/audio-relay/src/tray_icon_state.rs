/// Tray icon states corresponding to the coordinator status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayIconState {
    /// Ready to start recording.
    Idle,
    /// Currently recording audio.
    Recording,
    /// Upload pass in flight while not recording.
    Uploading,
    /// Microphone access denied; recording cannot start.
    PermissionNeeded,
}

impl TrayIconState {
    /// Fill color of the generated icon.
    pub fn color(self) -> [u8; 3] {
        match self {
            TrayIconState::Idle => [0x8a, 0x8f, 0x98],
            TrayIconState::Recording => [0xe0, 0x3c, 0x31],
            TrayIconState::Uploading => [0x2f, 0x80, 0xed],
            TrayIconState::PermissionNeeded => [0xf2, 0xa9, 0x00],
        }
    }
}
