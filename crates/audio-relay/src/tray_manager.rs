//! System tray icon with state-based updates.
//!
//! Manages a system tray icon with four states (Idle, Recording, Uploading,
//! Permission-needed) and a context menu mirroring the coordinator commands.

use crate::{AppCommand, AppError, AppResult, TrayIconState, TrayView};

use std::panic::Location;

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};
use tray_icon::menu::{Menu, MenuId, MenuItem, PredefinedMenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

/// Edge length of the generated icons in pixels.
pub(crate) const ICON_SIZE: u32 = 32;

/// Menu item ids, cloned to the runtime thread to decode menu events.
#[derive(Debug, Clone)]
pub struct MenuIds {
    pub(crate) toggle: MenuId,
    pub(crate) upload: MenuId,
    pub(crate) permission: MenuId,
    pub(crate) open_last: MenuId,
    pub(crate) copy_last: MenuId,
    pub(crate) exit: MenuId,
}

impl MenuIds {
    /// Command a click on `id` stands for.
    pub fn command_for(&self, id: &MenuId) -> Option<AppCommand> {
        let command = if *id == self.toggle {
            AppCommand::ToggleRecording
        } else if *id == self.upload {
            AppCommand::UploadNow
        } else if *id == self.permission {
            AppCommand::RequestPermission
        } else if *id == self.open_last {
            AppCommand::OpenLastUpload
        } else if *id == self.copy_last {
            AppCommand::CopyLastUploadUrl
        } else if *id == self.exit {
            AppCommand::Shutdown
        } else {
            return None;
        };
        Some(command)
    }
}

/// System tray icon manager.
pub struct TrayManager {
    tray_icon: TrayIcon,
    toggle_item: MenuItem,
    upload_item: MenuItem,
    permission_item: MenuItem,
    open_item: MenuItem,
    copy_item: MenuItem,
    ids: MenuIds,
    current: Option<TrayView>,
}

impl TrayManager {
    /// Create a new tray manager showing the idle state.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let toggle_item = MenuItem::new("Start Recording", true, None);
        let upload_item = MenuItem::new("Upload Now", true, None);
        let permission_item = MenuItem::new("Request Microphone Permission", true, None);
        let open_item = MenuItem::new("Open Last Upload", false, None);
        let copy_item = MenuItem::new("Copy Last Upload URL", false, None);
        let exit_item = MenuItem::new("Exit", true, None);

        let ids = MenuIds {
            toggle: toggle_item.id().clone(),
            upload: upload_item.id().clone(),
            permission: permission_item.id().clone(),
            open_last: open_item.id().clone(),
            copy_last: copy_item.id().clone(),
            exit: exit_item.id().clone(),
        };

        menu.append_items(&[
            &toggle_item,
            &upload_item,
            &permission_item,
            &PredefinedMenuItem::separator(),
            &open_item,
            &copy_item,
            &PredefinedMenuItem::separator(),
            &exit_item,
        ])
        .map_err(|e| AppError::TrayError {
            reason: format!("Failed to build tray menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let initial = TrayView::default();
        let icon = Self::load_icon(initial.state)?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(&initial.tooltip)
            .with_menu(Box::new(menu))
            .with_icon(icon)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        let mut manager = Self {
            tray_icon,
            toggle_item,
            upload_item,
            permission_item,
            open_item,
            copy_item,
            ids,
            current: None,
        };
        manager.apply(&initial)?;

        Ok(manager)
    }

    /// Redraw icon, tooltip and menu items. Unchanged views are skipped.
    #[track_caller]
    #[instrument(skip(self))]
    pub fn apply(&mut self, view: &TrayView) -> AppResult<()> {
        if self.current.as_ref() == Some(view) {
            return Ok(());
        }

        let icon_changed = self.current.as_ref().map(|c| c.state) != Some(view.state);
        if icon_changed {
            self.tray_icon
                .set_icon(Some(Self::load_icon(view.state)?))
                .map_err(|e| AppError::TrayError {
                    reason: format!("Failed to update icon: {}", e),
                    location: ErrorLocation::from(Location::caller()),
                })?;
        }

        self.tray_icon
            .set_tooltip(Some(&view.tooltip))
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to update tooltip: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.toggle_item.set_text(view.toggle_label);
        self.toggle_item
            .set_enabled(view.state != TrayIconState::PermissionNeeded);
        self.upload_item.set_enabled(view.upload_enabled);
        self.permission_item.set_enabled(view.permission_enabled);
        self.open_item.set_enabled(view.last_upload_available);
        self.copy_item.set_enabled(view.last_upload_available);

        debug!(state = ?view.state, "Tray updated");
        self.current = Some(view.clone());

        Ok(())
    }

    /// Ids for decoding menu events on another thread.
    pub fn menu_ids(&self) -> &MenuIds {
        &self.ids
    }

    #[track_caller]
    fn load_icon(state: TrayIconState) -> AppResult<Icon> {
        Icon::from_rgba(icon_rgba(state.color()), ICON_SIZE, ICON_SIZE).map_err(|e| {
            AppError::TrayError {
                reason: format!("Failed to create icon from RGBA: {}", e),
                location: ErrorLocation::from(Location::caller()),
            }
        })
    }
}

/// Filled circle of `color` on a transparent square.
pub(crate) fn icon_rgba(color: [u8; 3]) -> Vec<u8> {
    let size = ICON_SIZE as usize;
    let center = (ICON_SIZE as f32 - 1.0) / 2.0;
    let radius = ICON_SIZE as f32 / 2.0 - 2.0;

    let mut rgba = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let dx = x as f32 - center;
            let dy = y as f32 - center;
            let alpha = if dx * dx + dy * dy <= radius * radius {
                u8::MAX
            } else {
                0
            };
            rgba.extend_from_slice(&[color[0], color[1], color[2], alpha]);
        }
    }
    rgba
}
