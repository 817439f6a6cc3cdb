use crate::{
    ConnectFailure, ConnectionConfig, ReplayError,
    session::{RemoteAction, RemoteSession, SessionState, SessionTimeouts},
    tests::mock::{MockConnector, Reply, Script},
};

use std::time::Duration;

fn timeouts() -> SessionTimeouts {
    SessionTimeouts {
        connect: Duration::from_millis(200),
        request: Duration::from_millis(200),
        close: Duration::from_millis(200),
    }
}

#[allow(clippy::unwrap_used)]
fn config() -> ConnectionConfig {
    ConnectionConfig::new("127.0.0.1", 4444, None).unwrap()
}

/// WHAT: Closing twice reaches the transport once
/// WHY: The operation's Closing step may run after an early close
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_connected_session_when_closed_twice_then_transport_shutdown_once() {
    // Given: A connected session
    let (connector, counters) = MockConnector::new(Script::default());
    let mut session = RemoteSession::open(&connector, &config(), timeouts())
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Connected);

    // When: Closing twice
    session.close().await;
    session.close().await;

    // Then: Shutdown happened exactly once and the session is Closed
    assert_eq!(counters.shutdowns(), 1);
    assert_eq!(session.state(), SessionState::Closed);
}

/// WHAT: Closing a session that never connected is a no-op
/// WHY: Close runs unconditionally, even when connect failed
#[tokio::test]
async fn given_failed_connect_when_closing_then_no_shutdown_and_closed() {
    // Given: A connector that refuses connections
    let (connector, counters) = MockConnector::new(Script {
        connect_ok: false,
        ..Script::default()
    });
    let mut session = RemoteSession::new(timeouts());

    // When: Connect fails and the session is closed anyway
    let result = session.connect(&connector, &config()).await;
    session.close().await;

    // Then: Connection error, nothing to shut down
    assert!(matches!(
        result,
        Err(ReplayError::Connection {
            kind: ConnectFailure::Unreachable,
            ..
        })
    ));
    assert_eq!(counters.shutdowns(), 0);
    assert_eq!(session.state(), SessionState::Closed);
}

/// WHAT: A slow connect becomes a TimedOut connection error
/// WHY: A hung endpoint must not hold the guard forever
#[tokio::test]
async fn given_slow_endpoint_when_connecting_then_timed_out() {
    let (connector, _counters) = MockConnector::new(Script {
        connect_delay: Duration::from_secs(10),
        ..Script::default()
    });

    let result = RemoteSession::open(&connector, &config(), timeouts()).await;

    assert!(matches!(
        result,
        Err(ReplayError::Connection {
            kind: ConnectFailure::TimedOut,
            ..
        })
    ));
}

/// WHAT: A request that never gets an answer becomes a CallError
/// WHY: Calls must be bounded in time
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_hanging_request_when_calling_then_call_error() {
    let (connector, _counters) = MockConnector::new(Script {
        save: Reply::Hang,
        ..Script::default()
    });
    let mut session = RemoteSession::open(&connector, &config(), timeouts())
        .await
        .unwrap();

    let result = session.call(RemoteAction::SaveBuffer).await;
    session.close().await;

    assert!(matches!(
        result,
        Err(ReplayError::Call {
            action: RemoteAction::SaveBuffer,
            ..
        })
    ));
}

/// WHAT: Calling on a closed session fails without reaching the transport
/// WHY: Requests are only valid while Connected
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_closed_session_when_calling_then_call_error() {
    let (connector, counters) = MockConnector::new(Script::default());
    let mut session = RemoteSession::open(&connector, &config(), timeouts())
        .await
        .unwrap();
    session.close().await;

    let result = session.call(RemoteAction::SaveBuffer).await;

    assert!(result.is_err());
    assert!(result.unwrap_err().is_call_error());
    assert_eq!(counters.save_calls(), 0);
}

/// WHAT: Connecting an already connected session is reported as misuse
/// WHY: A second connect must not look like a wire-protocol failure
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_connected_session_when_connecting_again_then_invalid_state() {
    // Given: A connected session
    let (connector, counters) = MockConnector::new(Script::default());
    let mut session = RemoteSession::open(&connector, &config(), timeouts())
        .await
        .unwrap();

    // When: Connecting a second time
    let result = session.connect(&connector, &config()).await;

    // Then: Misuse error, no second transport, still connected
    assert!(matches!(
        result,
        Err(ReplayError::InvalidState {
            operation: "connect",
            state: SessionState::Connected,
            ..
        })
    ));
    assert_eq!(counters.connects(), 1);
    assert_eq!(session.state(), SessionState::Connected);
    session.close().await;
}
