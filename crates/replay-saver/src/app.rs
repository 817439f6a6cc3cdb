use crate::{AppCommand, AppResult, TrayCommand};

use std::time::Duration;

use replay_saver_core::{ReplayDispatcher, TriggerDisposition, TriggerSource};
use tao::event_loop::EventLoopProxy;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info, instrument, warn};
use tray_icon::menu::{MenuEvent, MenuId};

/// Main application state.
///
/// Runs on the async runtime thread. Sends lifecycle commands back to the
/// main thread via `tray_proxy` because `TrayIcon` is `!Send` and must
/// remain on the UI thread.
pub struct App {
    pub(crate) dispatcher: ReplayDispatcher,
    pub(crate) worker: JoinHandle<()>,
    pub(crate) tray_proxy: EventLoopProxy<TrayCommand>,
    pub(crate) command_tx: mpsc::Sender<AppCommand>,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
    pub(crate) save_menu_id: MenuId,
    pub(crate) quit_menu_id: MenuId,
}

impl App {
    /// Run the main application event loop.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Replay Saver starting");

        // Tray event forwarding via single persistent blocking task.
        //
        // MenuEvent::receiver() returns a crossbeam_channel::Receiver with a
        // blocking recv(), so one thread serves every click without polling.
        //
        // Shutdown: when tray_event_rx is dropped (main loop breaks),
        // tray_event_tx.blocking_send() fails, breaking the blocking loop.
        let (tray_event_tx, mut tray_event_rx) = mpsc::channel(32);
        let tray_handle = tokio::task::spawn_blocking(move || {
            let receiver = MenuEvent::receiver();
            while let Ok(event) = receiver.recv() {
                if tray_event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                Some(event) = tray_event_rx.recv() => {
                    self.handle_tray_event(event).await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        AppCommand::SaveReplay { source } => self.request_save(source),
                        AppCommand::Shutdown => {
                            info!("Shutdown requested");
                            break;
                        }
                    }
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

        // Dropping the last dispatcher stops the worker once any in-flight
        // save has finished.
        drop(self.dispatcher);
        match tokio::time::timeout(Duration::from_secs(10), self.worker).await {
            Ok(Ok(())) => debug!("Replay worker stopped cleanly"),
            Ok(Err(e)) => error!(error = ?e, "Replay worker panicked"),
            Err(_) => warn!("Replay worker still busy at shutdown, abandoning it"),
        }

        let _ = self.tray_proxy.send_event(TrayCommand::Shutdown);
        info!("Replay Saver shut down successfully");

        Ok(())
    }

    /// Hand a save request to the worker. Never waits for the save.
    #[instrument(skip(self))]
    fn request_save(&self, source: TriggerSource) {
        match self.dispatcher.trigger(source) {
            TriggerDisposition::Dispatched => info!(%source, "Replay save started"),
            TriggerDisposition::Rejected => debug!(%source, "Replay save already running, ignored"),
            TriggerDisposition::WorkerGone => error!(%source, "Replay worker is not running"),
        }
    }

    /// Handle tray menu events.
    #[instrument(skip(self))]
    async fn handle_tray_event(&self, event: MenuEvent) {
        let event_id = &event.id;

        if *event_id == self.save_menu_id {
            self.request_save(TriggerSource::TrayMenu);
        } else if *event_id == self.quit_menu_id {
            info!("Quit requested from tray menu");
            if let Err(e) = self.command_tx.send(AppCommand::Shutdown).await {
                error!(error = ?e, "Failed to send shutdown command");
            }
        }
    }
}
