//! Trigger dispatch onto a single background worker.
//!
//! Trigger sources call [`ReplayDispatcher::trigger`], which never blocks and
//! never runs the operation itself. Admitted invocations are handed to one
//! long-lived worker task through a queue of capacity one; the
//! [`InvocationGuard`] makes sure that queue never holds more than one.

use crate::{
    InvocationGuard, InvocationPermit, NotificationSink, OperationOutcome, ReplaySaver,
    session::Connector,
};

use std::{fmt, sync::Arc};

use tokio::{
    sync::mpsc::{self, error::TrySendError},
    task::JoinHandle,
};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

/// Where a save request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// The global hotkey was pressed.
    Hotkey,
    /// "Save Replay" was clicked in the tray menu.
    TrayMenu,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerSource::Hotkey => f.write_str("hotkey"),
            TriggerSource::TrayMenu => f.write_str("tray"),
        }
    }
}

/// What happened to a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDisposition {
    /// Handed to the worker.
    Dispatched,
    /// Another save is in flight; the trigger was dropped.
    Rejected,
    /// The worker has stopped; nothing will run.
    WorkerGone,
}

struct Invocation {
    id: Uuid,
    source: TriggerSource,
    permit: InvocationPermit,
}

/// Cloneable handle given to every trigger source.
#[derive(Clone)]
pub struct ReplayDispatcher {
    guard: Arc<InvocationGuard>,
    queue: mpsc::Sender<Invocation>,
}

impl ReplayDispatcher {
    /// Request a replay save.
    ///
    /// Returns immediately. A trigger that arrives while a save is in flight
    /// is dropped without notifying anyone.
    pub fn trigger(&self, source: TriggerSource) -> TriggerDisposition {
        let Some(permit) = self.guard.try_acquire() else {
            debug!(%source, "Replay save already in progress, trigger dropped");
            return TriggerDisposition::Rejected;
        };

        let invocation = Invocation {
            id: Uuid::new_v4(),
            source,
            permit,
        };
        let invocation_id = invocation.id;

        // A failed send drops the invocation and with it the permit.
        match self.queue.try_send(invocation) {
            Ok(()) => {
                debug!(%source, %invocation_id, "Replay save dispatched");
                TriggerDisposition::Dispatched
            }
            Err(TrySendError::Full(_)) => {
                warn!(%source, "Worker queue unexpectedly full, trigger dropped");
                TriggerDisposition::Rejected
            }
            Err(TrySendError::Closed(_)) => {
                error!(%source, "Replay worker has stopped");
                TriggerDisposition::WorkerGone
            }
        }
    }

    /// Whether a save is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.guard.is_busy()
    }
}

/// Start the replay worker on the current tokio runtime.
///
/// The worker exits once every [`ReplayDispatcher`] clone has been dropped.
pub fn spawn_worker<C: Connector>(
    saver: ReplaySaver<C>,
    notifier: Arc<dyn NotificationSink>,
) -> (ReplayDispatcher, JoinHandle<()>) {
    let (queue, mut invocations) = mpsc::channel::<Invocation>(1);
    let saver = Arc::new(saver);

    let handle = tokio::spawn(async move {
        info!("Replay worker started");

        while let Some(invocation) = invocations.recv().await {
            let Invocation { id, source, permit } = invocation;
            let span = info_span!("replay_save", invocation_id = %id, %source);

            let outcome = run_isolated(Arc::clone(&saver)).instrument(span.clone()).await;

            span.in_scope(|| {
                let (title, message) = outcome.notification();
                notifier.notify(title, message);
                debug!(success = outcome.is_success(), "Replay save finished");
            });

            drop(permit);
        }

        info!("Replay worker stopped");
    });

    let dispatcher = ReplayDispatcher {
        guard: Arc::new(InvocationGuard::new()),
        queue,
    };

    (dispatcher, handle)
}

/// Run one save in its own task so a panic cannot take the worker down.
async fn run_isolated<C: Connector>(saver: Arc<ReplaySaver<C>>) -> OperationOutcome {
    let task = tokio::spawn(async move { saver.save_replay().await }.in_current_span());

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "Replay save task failed");
            OperationOutcome::Failure {
                reason: "Internal error while saving the replay".to_string(),
            }
        }
    }
}
