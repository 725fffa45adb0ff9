//! Clipboard and browser hand-off for upload links.

use crate::{AppError, AppResult};

use std::panic::Location;

use arboard::Clipboard;
use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Sends the last upload URL to the clipboard or the default browser.
pub struct OutputHandler {
    pub(crate) clipboard: Clipboard,
}

impl OutputHandler {
    /// Create a new output handler.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let clipboard = Clipboard::new().map_err(|e| AppError::ClipboardError {
            reason: format!("Failed to initialize clipboard: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        info!("OutputHandler initialized");

        Ok(Self { clipboard })
    }

    /// Copy `url` to the clipboard.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn copy_url(&mut self, url: &str) -> AppResult<()> {
        self.clipboard
            .set_text(url)
            .map_err(|e| AppError::ClipboardError {
                reason: format!("Failed to set clipboard: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Upload URL copied to clipboard");

        Ok(())
    }

    /// Open `url` with the system's default handler.
    #[instrument]
    pub async fn open_url(url: &str) -> AppResult<()> {
        let target = url.to_string();

        // `open::that` can block until the launcher returns.
        tokio::task::spawn_blocking(move || open::that(&target))
            .await
            .map_err(|e| AppError::OpenFailed {
                reason: format!("Open task panicked: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .map_err(|e| AppError::OpenFailed {
                reason: format!("{}: {}", url, e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        debug!("Upload URL opened");

        Ok(())
    }
}
