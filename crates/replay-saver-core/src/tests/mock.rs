//! Scriptable endpoint and notification doubles.

use crate::{
    ConnectFailure, ConnectionConfig, CoreResult, NotificationSink, ReplayDispatcher, ReplayError,
    session::{Connector, RemoteAction, Transport},
};

use std::{
    panic::Location,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use error_location::ErrorLocation;

/// How the fake endpoint answers one kind of request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reply {
    Ack,
    Reject,
    Hang,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Script {
    pub connect_ok: bool,
    pub connect_delay: Duration,
    pub ensure: Reply,
    pub save: Reply,
    pub panic_on_save: bool,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            connect_ok: true,
            connect_delay: Duration::ZERO,
            ensure: Reply::Ack,
            save: Reply::Ack,
            panic_on_save: false,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub connects: AtomicUsize,
    pub ensure_calls: AtomicUsize,
    pub save_calls: AtomicUsize,
    pub shutdowns: AtomicUsize,
}

impl Counters {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn ensure_calls(&self) -> usize {
        self.ensure_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockConnector {
    script: Script,
    counters: Arc<Counters>,
}

impl MockConnector {
    pub fn new(script: Script) -> (Self, Arc<Counters>) {
        let counters = Arc::new(Counters::default());
        (
            Self {
                script,
                counters: Arc::clone(&counters),
            },
            counters,
        )
    }
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    async fn connect(&self, config: &ConnectionConfig) -> CoreResult<MockTransport> {
        self.counters.connects.fetch_add(1, Ordering::SeqCst);

        if !self.script.connect_delay.is_zero() {
            tokio::time::sleep(self.script.connect_delay).await;
        }

        if !self.script.connect_ok {
            return Err(ReplayError::Connection {
                kind: ConnectFailure::Unreachable,
                cause: format!("{}:{}: connection refused", config.host(), config.port()),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(MockTransport {
            script: self.script,
            counters: Arc::clone(&self.counters),
        })
    }
}

pub(crate) struct MockTransport {
    script: Script,
    counters: Arc<Counters>,
}

impl Transport for MockTransport {
    async fn request(&mut self, action: RemoteAction) -> CoreResult<()> {
        let reply = match action {
            RemoteAction::EnsureBufferActive => {
                self.counters.ensure_calls.fetch_add(1, Ordering::SeqCst);
                self.script.ensure
            }
            RemoteAction::SaveBuffer => {
                self.counters.save_calls.fetch_add(1, Ordering::SeqCst);
                if self.script.panic_on_save {
                    #[allow(clippy::panic)]
                    {
                        panic!("simulated fault while saving");
                    }
                }
                self.script.save
            }
        };

        match reply {
            Reply::Ack => Ok(()),
            Reply::Reject => Err(ReplayError::Call {
                action,
                cause: "code 500: simulated rejection".to_string(),
                location: ErrorLocation::from(Location::caller()),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }

    async fn shutdown(&mut self) {
        self.counters.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

/// Notification sink that records everything it is given.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    #[allow(clippy::unwrap_used)]
    pub fn notifications(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    #[allow(clippy::unwrap_used)]
    fn notify(&self, title: &str, message: &str) {
        self.seen
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

/// Wait until `sink` has seen at least `count` notifications.
pub(crate) async fn wait_for_notifications(sink: &RecordingSink, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sink.notifications().len() < count && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Wait until the dispatcher reports no save in flight.
pub(crate) async fn wait_until_idle(dispatcher: &ReplayDispatcher) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while dispatcher.is_busy() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
