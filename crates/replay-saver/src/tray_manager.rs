//! System tray icon with the Save Replay / Quit menu.

use crate::{AppError, AppResult};

use std::{
    panic::Location,
    path::{Path, PathBuf},
};

use error_location::ErrorLocation;
use image::{Rgba, RgbaImage};
use tracing::{debug, info, instrument, warn};
use tray_icon::menu::{Menu, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

const ICON_SIZE: u32 = 64;
const TOOLTIP: &str = "Replay Saver";
const ICON_FILE_NAME: &str = "replay-saver.ico";

/// System tray icon manager.
pub struct TrayManager {
    _tray_icon: TrayIcon,
    save_item_id: MenuId,
    quit_item_id: MenuId,
}

impl TrayManager {
    /// Create the tray icon and its menu.
    #[track_caller]
    #[instrument]
    pub fn new() -> AppResult<Self> {
        let menu = Menu::new();

        let save_item = MenuItem::new("Save Replay", true, None);
        let quit_item = MenuItem::new("Quit", true, None);

        let save_id = save_item.id().clone();
        let quit_id = quit_item.id().clone();

        menu.append(&save_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add save menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        menu.append(&quit_item).map_err(|e| AppError::TrayError {
            reason: format!("Failed to add quit menu: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let tray_icon = TrayIconBuilder::new()
            .with_tooltip(TOOLTIP)
            .with_menu(Box::new(menu))
            .with_icon(Self::build_icon()?)
            .build()
            .map_err(|e| AppError::TrayError {
                reason: format!("Failed to create tray icon: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!("System tray icon initialized");

        Ok(Self {
            _tray_icon: tray_icon,
            save_item_id: save_id,
            quit_item_id: quit_id,
        })
    }

    /// Tray icon from `replay-saver.ico` next to the executable, or the
    /// drawn square when that file is absent or unreadable.
    #[track_caller]
    fn build_icon() -> AppResult<Icon> {
        let img = icon_file_path()
            .and_then(|path| load_icon_file(&path))
            .unwrap_or_else(icon_image);
        let (width, height) = (img.width(), img.height());

        Icon::from_rgba(img.into_raw(), width, height).map_err(|e| AppError::TrayError {
            reason: format!("Failed to create icon from RGBA: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Get the "Save Replay" menu item ID.
    pub fn save_item_id(&self) -> &MenuId {
        &self.save_item_id
    }

    /// Get the "Quit" menu item ID.
    pub fn quit_item_id(&self) -> &MenuId {
        &self.quit_item_id
    }
}

fn icon_file_path() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    exe.parent().map(|dir| dir.join(ICON_FILE_NAME))
}

/// Decode a user-supplied icon file. `None` when missing or undecodable.
pub(crate) fn load_icon_file(path: &Path) -> Option<RgbaImage> {
    if !path.is_file() {
        return None;
    }

    match image::open(path) {
        Ok(img) => {
            debug!(path = %path.display(), "Loaded tray icon from file");
            Some(img.into_rgba8())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Unreadable tray icon, using the built-in one");
            None
        }
    }
}

/// Built-in tray icon: a white square on a transparent background.
pub(crate) fn icon_image() -> RgbaImage {
    let inset = ICON_SIZE / 4;
    let inside = inset..ICON_SIZE - inset;

    RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        if inside.contains(&x) && inside.contains(&y) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}
