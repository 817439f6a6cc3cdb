//! Replay Saver: save the OBS replay buffer from a global hotkey or the tray.

mod app;
mod app_command;
mod config;
mod console;
mod desktop_notifier;
mod error;
mod hotkey_handler;
mod logging;
#[cfg(test)]
mod tests;
mod tray_command;
mod tray_manager;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    desktop_notifier::DesktopNotifier,
    error::{AppError, Result as AppResult},
    hotkey_handler::HotkeyHandler,
    tray_command::TrayCommand,
    tray_manager::TrayManager,
};

use crate::config::Config;

use std::sync::Arc;

use replay_saver_core::{ObsConnector, ReplaySaver, spawn_worker};
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder},
};
use tokio::sync::{mpsc, watch};
use tracing::error;

const APP_TITLE: &str = "Replay Saver";

/// Report a startup failure to the user and exit with code 1.
fn fatal(context: &str, e: &AppError) -> ! {
    error!(error = ?e, "{}", context);
    DesktopNotifier::new().notify_blocking(APP_TITLE, &format!("{}: {}", context, e));
    std::process::exit(1);
}

/// Application entry point.
fn main() {
    let _log_guard = logging::init();

    // Settings are completed (prompting on the console if needed) before any
    // UI exists.
    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => fatal("Failed to load settings", &e),
    };

    if let Err(e) = config::ensure_complete(&mut config) {
        fatal("Settings incomplete", &e);
    }

    let connection = match config.connection() {
        Ok(c) => c,
        Err(e) => fatal("Invalid OBS settings", &e),
    };

    let binding = match config.hotkey_binding() {
        Ok(b) => b.to_string(),
        Err(e) => fatal("No hotkey configured", &e),
    };
    if let Err(e) = HotkeyHandler::parse_binding(&binding) {
        fatal("Invalid hotkey", &e);
    }

    let event_loop = EventLoopBuilder::<TrayCommand>::with_user_event().build();
    let tray_proxy = event_loop.create_proxy();

    // Register on the main thread before any UI exists; tao's event loop
    // pumps the Windows messages needed for WM_HOTKEY delivery once running.
    // Dropping the manager unregisters the hotkey.
    let (hotkey_manager, hotkey_id) = match HotkeyHandler::register_hotkey(&binding) {
        Ok(pair) => pair,
        Err(e) => fatal("Failed to register hotkey", &e),
    };

    console::hide_console();

    // TrayManager lives on the main thread - TrayIcon is !Send on all platforms.
    let tray_manager = match TrayManager::new() {
        Ok(tm) => tm,
        Err(e) => fatal("Failed to create tray icon", &e),
    };

    let mut startup = Some((connection, config.operation_timing()));

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(TrayCommand::Shutdown) => {
                *control_flow = ControlFlow::ExitWithCode(0);
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                let Some((connection, timing)) = startup.take() else {
                    return;
                };

                #[cfg(target_os = "macos")]
                unsafe {
                    use core_foundation::runloop::{CFRunLoopGetMain, CFRunLoopWakeUp};
                    CFRunLoopWakeUp(CFRunLoopGetMain());
                }

                let tray_proxy = tray_proxy.clone();
                let save_menu_id = tray_manager.save_item_id().clone();
                let quit_menu_id = tray_manager.quit_item_id().clone();

                // Spawn tokio runtime on separate thread.
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
                        let (command_tx, command_rx) = mpsc::channel(32);
                        let (shutdown_tx, shutdown_rx) = watch::channel(false);

                        let saver = ReplaySaver::new(ObsConnector::new(), connection, timing);
                        let (dispatcher, worker) =
                            spawn_worker(saver, Arc::new(DesktopNotifier::new()));

                        let hotkey_handler = HotkeyHandler::new(hotkey_id, command_tx.clone());

                        let app = App {
                            dispatcher,
                            worker,
                            tray_proxy,
                            command_tx,
                            command_rx,
                            shutdown_tx,
                            save_menu_id,
                            quit_menu_id,
                        };

                        tokio::join!(
                            async {
                                if let Err(e) = hotkey_handler.run(shutdown_rx).await {
                                    error!(error = ?e, "Hotkey handler error");
                                }
                            },
                            async {
                                if let Err(e) = app.run().await {
                                    error!(error = ?e, "App error");
                                }
                            }
                        );
                    });
                });
            }
            _ => {}
        }

        // Keep hotkey_manager and the tray icon alive in the closure for the
        // app's lifetime.
        let _ = (&hotkey_manager, &tray_manager);
    });
}
