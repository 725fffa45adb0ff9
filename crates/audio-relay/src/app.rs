use crate::{
    AppCommand, AppError, AppResult, MenuIds, Notifier, OutputHandler, TrayCommand, TrayView,
};

use std::{panic::Location, time::Duration};

use audio_relay_core::{CoordinatorCommand, CoordinatorStatus};
use error_location::ErrorLocation;
use tao::event_loop::EventLoopProxy;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};
use tray_icon::menu::MenuEvent;

/// Presentation side of the application.
///
/// Runs on the async runtime thread. Turns hotkey and menu input into
/// coordinator commands and pushes every status change to the main thread
/// via `tray_proxy`, because `TrayIcon` is `!Send` and must remain on the
/// UI thread.
pub struct App {
    pub(crate) coordinator_tx: mpsc::Sender<CoordinatorCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) status_rx: watch::Receiver<CoordinatorStatus>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) menu_ids: MenuIds,
    pub(crate) notifier: Notifier,
    pub(crate) output_handler: Option<OutputHandler>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the presentation loop until shutdown is requested or the
    /// coordinator goes away.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Audio Relay starting");

        // MenuEvent::receiver() has a blocking recv(); one blocking task
        // forwards it and exits once tray_event_rx is dropped.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        let mut last_status = self.status_rx.borrow_and_update().clone();
        self.push_view(&last_status);

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    let Some(command) = self.menu_ids.command_for(&event.id) else {
                        continue;
                    };
                    if !self.dispatch(command).await {
                        break;
                    }
                }

                Some(command) = self.command_rx.recv() => {
                    if !self.dispatch(command).await {
                        break;
                    }
                }

                changed = self.status_rx.changed() => {
                    if changed.is_err() {
                        info!("Coordinator stopped, shutting down");
                        break;
                    }
                    let status = self.status_rx.borrow_and_update().clone();
                    self.notifier.on_status(&last_status, &status);
                    self.push_view(&status);
                    last_status = status;
                }

                else => {
                    info!("All channels closed, shutting down");
                    break;
                }
            }
        }

        drop(tray_event_rx);

        match tokio::time::timeout(Duration::from_secs(1), tray_handle).await {
            Ok(Ok(())) => info!("Tray event forwarder stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Tray event forwarder task panicked"),
            Err(_) => info!(
                "Tray event forwarder did not stop within timeout, \
                     will be cleaned up on exit"
            ),
        }

        let _ = self.shutdown_tx.send(true);
        info!("Audio Relay presentation loop stopped");

        Ok(())
    }

    /// Handle one command. Returns `false` once shutdown has been requested.
    async fn dispatch(&mut self, command: AppCommand) -> bool {
        if let Err(e) = self.handle_command(command).await {
            error!(command = ?command, error = ?e, "Failed to handle command");
        }
        command != AppCommand::Shutdown
    }

    #[instrument(skip(self))]
    async fn handle_command(&mut self, command: AppCommand) -> AppResult<()> {
        if let Some(forwarded) = coordinator_command_for(command) {
            return self.forward(forwarded).await;
        }

        let Some(url) = self.status_rx.borrow().last_upload_url.clone() else {
            info!(command = ?command, "No upload yet");
            return Ok(());
        };

        match command {
            AppCommand::OpenLastUpload => OutputHandler::open_url(&url).await,
            AppCommand::CopyLastUploadUrl => match self.output_handler.as_mut() {
                Some(output) => output.copy_url(&url),
                None => {
                    warn!("Clipboard unavailable");
                    Ok(())
                }
            },
            _ => Ok(()),
        }
    }

    async fn forward(&self, command: CoordinatorCommand) -> AppResult<()> {
        self.coordinator_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}: {}", command, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    fn push_view(&self, status: &CoordinatorStatus) {
        let view = TrayView::from_status(status);
        if self.tray_proxy.send_event(TrayCommand::Update(view)).is_err() {
            warn!("Tray event loop closed, dropping update");
        }
    }
}

/// Coordinator command an [`AppCommand`] maps to. Link commands are handled
/// locally and map to `None`.
pub(crate) fn coordinator_command_for(command: AppCommand) -> Option<CoordinatorCommand> {
    match command {
        AppCommand::ToggleRecording => Some(CoordinatorCommand::ToggleRecording),
        AppCommand::UploadNow => Some(CoordinatorCommand::UploadNow),
        AppCommand::RequestPermission => Some(CoordinatorCommand::RequestPermission),
        AppCommand::Shutdown => Some(CoordinatorCommand::Shutdown),
        AppCommand::OpenLastUpload | AppCommand::CopyLastUploadUrl => None,
    }
}
