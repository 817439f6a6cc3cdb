//! Replay Saver Core Library
//!
//! Triggers "save replay buffer" on a running OBS Studio instance through
//! obs-websocket, with at most one save in flight at a time.
//!
//! # Example
//!
//! ```no_run
//! use replay_saver_core::{
//!     ConnectionConfig, CoreResult, NotificationSink, ObsConnector, OperationTiming,
//!     ReplaySaver, TriggerSource, spawn_worker,
//! };
//!
//! use std::sync::Arc;
//!
//! struct StdoutSink;
//!
//! impl NotificationSink for StdoutSink {
//!     fn notify(&self, title: &str, message: &str) {
//!         println!("{}: {}", title, message);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let config = ConnectionConfig::new("127.0.0.1", 4444, None)?;
//!     let saver = ReplaySaver::new(ObsConnector::new(), config, OperationTiming::default());
//!     let (dispatcher, worker) = spawn_worker(saver, Arc::new(StdoutSink));
//!
//!     dispatcher.trigger(TriggerSource::Hotkey);
//!
//!     drop(dispatcher);
//!     let _ = worker.await;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod guard;
mod notify;
mod obs;
mod operation;
pub mod session;
mod worker;

pub use {
    config::{
        ConnectionConfig, DEFAULT_ACTIVATION_DELAY, DEFAULT_CLOSE_TIMEOUT, DEFAULT_CONNECT_TIMEOUT,
        DEFAULT_REQUEST_TIMEOUT, MAX_ACTIVATION_DELAY, OperationTiming,
    },
    error::{ConnectFailure, ReplayError, Result as CoreResult},
    guard::{InvocationGuard, InvocationPermit},
    notify::NotificationSink,
    obs::{ObsConnector, ObsTransport},
    operation::{
        FAILURE_TITLE, OperationOutcome, OperationStep, ReplaySaver, SUCCESS_MESSAGE,
        SUCCESS_TITLE,
    },
    worker::{ReplayDispatcher, TriggerDisposition, TriggerSource, spawn_worker},
};

#[cfg(test)]
mod tests;
