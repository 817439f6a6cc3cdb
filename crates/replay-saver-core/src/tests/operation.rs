use crate::{
    ConnectionConfig, FAILURE_TITLE, OperationOutcome, OperationTiming, ReplaySaver,
    SUCCESS_MESSAGE, SUCCESS_TITLE,
    tests::mock::{MockConnector, Reply, Script},
};

use std::time::Duration;

fn timing() -> OperationTiming {
    OperationTiming::new(
        Duration::from_millis(10),
        Duration::from_millis(200),
        Duration::from_millis(200),
        Duration::from_millis(200),
    )
}

#[allow(clippy::unwrap_used)]
fn config() -> ConnectionConfig {
    ConnectionConfig::new("127.0.0.1", 4444, None).unwrap()
}

/// WHAT: Both calls acknowledged yields Success
/// WHY: The happy path must issue start, then save, then close
#[tokio::test]
async fn given_acknowledging_endpoint_when_saving_then_success() {
    // Given: An endpoint that acknowledges everything
    let (connector, counters) = MockConnector::new(Script::default());
    let saver = ReplaySaver::new(connector, config(), timing());

    // When: Running the operation
    let outcome = saver.save_replay().await;

    // Then: Success with the expected notification text
    assert_eq!(outcome, OperationOutcome::Success);
    assert_eq!(outcome.notification(), (SUCCESS_TITLE, SUCCESS_MESSAGE));
    assert_eq!(counters.ensure_calls(), 1);
    assert_eq!(counters.save_calls(), 1);
    assert_eq!(counters.shutdowns(), 1);
}

/// WHAT: Rejected EnsureBufferActive is not fatal
/// WHY: The endpoint rejects "start" when the buffer is already running
#[tokio::test]
async fn given_rejected_start_when_saving_then_still_success() {
    let (connector, counters) = MockConnector::new(Script {
        ensure: Reply::Reject,
        ..Script::default()
    });
    let saver = ReplaySaver::new(connector, config(), timing());

    let outcome = saver.save_replay().await;

    assert!(outcome.is_success());
    assert_eq!(counters.save_calls(), 1);
    assert_eq!(counters.shutdowns(), 1);
}

/// WHAT: Timed-out EnsureBufferActive is swallowed too
/// WHY: Any CallError from the start step is tolerated by policy
#[tokio::test]
async fn given_hanging_start_when_saving_then_still_success() {
    let (connector, counters) = MockConnector::new(Script {
        ensure: Reply::Hang,
        ..Script::default()
    });
    let saver = ReplaySaver::new(connector, config(), timing());

    let outcome = saver.save_replay().await;

    assert!(outcome.is_success());
    assert_eq!(counters.save_calls(), 1);
}

/// WHAT: Rejected SaveBuffer yields Failure and still closes once
/// WHY: The save step is the one that matters; cleanup is unconditional
#[tokio::test]
async fn given_rejected_save_when_saving_then_failure_and_single_close() {
    let (connector, counters) = MockConnector::new(Script {
        save: Reply::Reject,
        ..Script::default()
    });
    let saver = ReplaySaver::new(connector, config(), timing());

    let outcome = saver.save_replay().await;

    let (title, message) = outcome.notification();
    assert_eq!(title, FAILURE_TITLE);
    assert!(!message.is_empty());
    assert_eq!(counters.shutdowns(), 1);
}

/// WHAT: Timed-out SaveBuffer yields Failure and still closes once
/// WHY: A hung endpoint must surface as an error, not a stall
#[tokio::test]
async fn given_hanging_save_when_saving_then_failure_and_single_close() {
    let (connector, counters) = MockConnector::new(Script {
        save: Reply::Hang,
        ..Script::default()
    });
    let saver = ReplaySaver::new(connector, config(), timing());

    let outcome = saver.save_replay().await;

    assert!(!outcome.is_success());
    assert!(outcome.notification().1.contains("no acknowledgement"));
    assert_eq!(counters.shutdowns(), 1);
}

/// WHAT: Connection failure skips both remote calls
/// WHY: Nothing can be sent without a session
#[tokio::test]
async fn given_unreachable_endpoint_when_saving_then_failure_without_calls() {
    let (connector, counters) = MockConnector::new(Script {
        connect_ok: false,
        ..Script::default()
    });
    let saver = ReplaySaver::new(connector, config(), timing());

    let outcome = saver.save_replay().await;

    let (title, message) = outcome.notification();
    assert_eq!(title, FAILURE_TITLE);
    assert!(message.contains("Could not connect"));
    assert_eq!(counters.ensure_calls(), 0);
    assert_eq!(counters.save_calls(), 0);
    assert_eq!(counters.shutdowns(), 0);
}

/// WHAT: The activation delay separates start and save
/// WHY: The endpoint needs time to finish starting the buffer
#[tokio::test]
async fn given_activation_delay_when_saving_then_run_takes_at_least_the_delay() {
    let (connector, _counters) = MockConnector::new(Script::default());
    let timing = OperationTiming::new(
        Duration::from_millis(100),
        Duration::from_millis(200),
        Duration::from_millis(200),
        Duration::from_millis(200),
    );
    let saver = ReplaySaver::new(connector, config(), timing);

    let start = std::time::Instant::now();
    let outcome = saver.save_replay().await;

    assert!(outcome.is_success());
    assert!(start.elapsed() >= Duration::from_millis(100));
}
