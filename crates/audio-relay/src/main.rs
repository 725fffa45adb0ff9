//! Audio Relay: records the microphone in the background and uploads it to
//! Cloudinary, controlled from the system tray and a global hotkey.

mod app;
mod app_command;
mod config;
mod error;
mod hotkey_handler;
mod logging;
mod notifier;
mod output_handler;
mod tray_command;
mod tray_icon_state;
mod tray_manager;
mod tray_view;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    notifier::Notifier,
    output_handler::OutputHandler,
    tray_command::TrayCommand,
    tray_icon_state::TrayIconState,
    tray_manager::{MenuIds, TrayManager},
    tray_view::TrayView,
};

use crate::config::Config;

use std::sync::Arc;

use audio_relay_core::{
    AudioCapturer, CloudinaryUploader, Coordinator, FilePermissionStore, FileSegmentStore,
    MemorySegmentStore, SegmentStore,
};
use global_hotkey::GlobalHotKeyManager;
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

/// Application entry point.
fn main() {
    let _log_guard = logging::init(Config::log_dir().ok().as_deref());

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate_upload() {
        error!("Upload settings incomplete: {:?}", e);
        std::process::exit(1);
    }

    let coordinator = match build_coordinator(&config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Coordinator: {:?}", e);
            std::process::exit(1);
        }
    };
    let notifier = Notifier::new(config.behavior.notifications);

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let mut tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => {
            error!("Failed to create TrayManager: {:?}", e);
            std::process::exit(1);
        }
    };

    // Persists across event loop iterations; dropping it unregisters the hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;
    let mut coordinator = Some(coordinator);

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(cmd) => {
                match cmd {
                    TrayCommand::Update(view) => {
                        if let Err(e) = tray_manager.apply(&view) {
                            error!(error = ?e, "Failed to update tray icon");
                        }
                    }
                    TrayCommand::Shutdown => {
                        *control_flow = ControlFlow::ExitWithCode(0);
                    }
                }
                return;
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let Some(coordinator) = coordinator.take() else {
                    return;
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                // Registered on the main thread: tao's event loop pumps the
                // Windows messages needed for WM_HOTKEY delivery. The tray
                // still works without it.
                let hotkey_id = match HotkeyHandler::register_hotkey() {
                    Ok((manager, id)) => {
                        hotkey_manager = Some(manager);
                        Some(id)
                    }
                    Err(e) => {
                        warn!(error = ?e, "Continuing without global hotkey");
                        None
                    }
                };

                let (command_tx, command_rx) = mpsc::channel(32);
                let (coordinator_tx, coordinator_rx) = mpsc::channel(32);
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let status_rx = coordinator.subscribe();
                let menu_ids = tray_manager.menu_ids().clone();
                let app_proxy = tray_proxy.clone();
                let exit_proxy = tray_proxy.clone();

                // TrayManager and hotkey_manager stay on the main thread.
                std::thread::spawn(move || {
                    let rt = match tokio::runtime::Runtime::new() {
                        Ok(rt) => rt,
                        Err(e) => {
                            error!("Failed to create tokio runtime: {:?}", e);
                            std::process::exit(1);
                        }
                    };

                    rt.block_on(async {
                        let hotkey_handler =
                            hotkey_id.map(|id| HotkeyHandler::new(id, command_tx.clone()));

                        let output_handler = match OutputHandler::new() {
                            Ok(oh) => Some(oh),
                            Err(e) => {
                                warn!(error = ?e, "Copy Last Upload URL disabled");
                                None
                            }
                        };

                        let app = App {
                            coordinator_tx,
                            command_rx,
                            status_rx,
                            tray_proxy: app_proxy,
                            menu_ids,
                            notifier,
                            output_handler,
                            shutdown_tx,
                        };

                        tokio::join!(
                            coordinator.run(coordinator_rx),
                            async {
                                if let Some(handler) = &hotkey_handler {
                                    if let Err(e) = handler.run(shutdown_rx).await {
                                        error!(error = ?e, "Hotkey handler error");
                                    }
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });

                    info!("Audio Relay shut down successfully");
                    let _ = exit_proxy.send_event(TrayCommand::Shutdown);
                });
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}

/// Wire the coordinator to the platform microphone, the configured store and
/// Cloudinary.
fn build_coordinator(config: &Config) -> AppResult<Coordinator> {
    let store: Arc<dyn SegmentStore> = match open_segment_store(config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = ?e, "Segments will be kept in memory only");
            Arc::new(MemorySegmentStore::new())
        }
    };

    let uploader = Arc::new(CloudinaryUploader::new(config.cloudinary_settings())?);
    let permissions = Box::new(FilePermissionStore::new(Config::permission_path()?));
    let capture = Box::new(AudioCapturer::new());

    Ok(Coordinator::new(
        capture,
        store,
        uploader,
        permissions,
        config.coordinator_settings(),
    ))
}

fn open_segment_store(config: &Config) -> AppResult<FileSegmentStore> {
    let dir = config.segment_dir()?;
    let store = FileSegmentStore::open(&dir)?;
    info!(segment_dir = ?dir, "Segment store opened");
    Ok(store)
}
