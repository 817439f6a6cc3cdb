use crate::{
    ConnectFailure, ConnectionConfig, CoreResult, ReplayError,
    obs::protocol::{
        self, CLOSE_AUTHENTICATION_FAILED, CLOSE_UNSUPPORTED_RPC_VERSION, Hello, Identified,
        Identify, OpCode, RPC_VERSION, RawFrame, Request, RequestResponse,
    },
    session::{Connector, RemoteAction, Transport},
};

use std::panic::Location;

use error_location::ErrorLocation;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, protocol::CloseFrame},
};
use tracing::{debug, info, instrument, trace};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects to OBS Studio through obs-websocket (protocol v5).
#[derive(Debug, Clone, Copy, Default)]
pub struct ObsConnector;

impl ObsConnector {
    /// Create a connector.
    pub fn new() -> Self {
        Self
    }
}

impl Connector for ObsConnector {
    type Transport = ObsTransport;

    #[instrument(skip(self, config), fields(url = %config.url()))]
    async fn connect(&self, config: &ConnectionConfig) -> CoreResult<ObsTransport> {
        let (stream, _response) =
            connect_async(config.url())
                .await
                .map_err(|e| ReplayError::Connection {
                    kind: ConnectFailure::Unreachable,
                    cause: format!("{}:{}: {}", config.host(), config.port(), e),
                    location: ErrorLocation::from(Location::caller()),
                })?;

        // On any handshake error `stream` is dropped here, which releases
        // the TCP connection.
        let stream = identify(stream, config.credential()).await?;

        info!("Connected to OBS");

        Ok(ObsTransport {
            stream,
            next_request_id: 1,
        })
    }
}

/// An identified obs-websocket connection.
pub struct ObsTransport {
    stream: WsStream,
    next_request_id: u64,
}

impl ObsTransport {
    fn request_type(action: RemoteAction) -> &'static str {
        match action {
            RemoteAction::EnsureBufferActive => "StartReplayBuffer",
            RemoteAction::SaveBuffer => "SaveReplayBuffer",
        }
    }
}

impl Transport for ObsTransport {
    #[instrument(skip(self))]
    async fn request(&mut self, action: RemoteAction) -> CoreResult<()> {
        let call_error = |cause: String| ReplayError::Call {
            action,
            cause,
            location: ErrorLocation::from(Location::caller()),
        };

        let request_id = self.next_request_id.to_string();
        self.next_request_id += 1;

        let frame = protocol::encode(
            OpCode::Request,
            Request {
                request_type: Self::request_type(action).to_string(),
                request_id: request_id.clone(),
            },
        )
        .map_err(|e| call_error(format!("failed to encode request: {}", e)))?;

        self.stream
            .send(Message::Text(frame.into()))
            .await
            .map_err(|e| call_error(format!("failed to send request: {}", e)))?;

        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => return Err(call_error(format!("connection error: {}", e))),
                None => return Err(call_error("connection closed by OBS".to_string())),
            };

            let text = match message {
                Message::Text(text) => text,
                Message::Close(frame) => {
                    return Err(call_error(format!(
                        "connection closed by OBS{}",
                        describe_close(frame.as_ref())
                    )));
                }
                _ => continue,
            };

            let frame: RawFrame = match serde_json::from_str(text.as_str()) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!(error = %e, "Ignoring unparseable frame");
                    continue;
                }
            };

            if frame.opcode() != Some(OpCode::RequestResponse) {
                trace!(op = frame.op, "Skipping frame while awaiting response");
                continue;
            }

            let response: RequestResponse = frame
                .payload()
                .map_err(|e| call_error(format!("malformed response: {}", e)))?;

            if response.request_id != request_id {
                debug!(
                    request_id = %response.request_id,
                    request_type = %response.request_type,
                    "Ignoring response to another request"
                );
                continue;
            }

            if response.request_status.result {
                debug!(code = response.request_status.code, "Request acknowledged");
                return Ok(());
            }

            return Err(call_error(response.request_status.describe()));
        }
    }

    #[instrument(skip(self))]
    async fn shutdown(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "Close handshake failed");
        }
    }
}

/// Run the Hello/Identify/Identified exchange.
async fn identify(mut stream: WsStream, credential: Option<&str>) -> CoreResult<WsStream> {
    let failure = |kind: ConnectFailure, cause: String| ReplayError::Connection {
        kind,
        cause,
        location: ErrorLocation::from(Location::caller()),
    };

    let hello: Hello = next_handshake_frame(&mut stream, OpCode::Hello).await?;

    debug!(
        obs_websocket_version = ?hello.obs_web_socket_version,
        rpc_version = hello.rpc_version,
        auth_required = hello.authentication.is_some(),
        "Received Hello"
    );

    if hello.rpc_version < RPC_VERSION {
        return Err(failure(
            ConnectFailure::ProtocolMismatch,
            format!(
                "OBS speaks RPC version {}, version {} is required",
                hello.rpc_version, RPC_VERSION
            ),
        ));
    }

    let authentication = match (&hello.authentication, credential) {
        (Some(auth), Some(password)) => Some(protocol::authentication_string(
            password,
            &auth.salt,
            &auth.challenge,
        )),
        (Some(_), None) => {
            return Err(failure(
                ConnectFailure::AuthRejected,
                "OBS requires a password but none is configured".to_string(),
            ));
        }
        (None, _) => None,
    };

    let identify = protocol::encode(
        OpCode::Identify,
        Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: 0,
        },
    )
    .map_err(|e| {
        failure(
            ConnectFailure::ProtocolMismatch,
            format!("failed to encode Identify: {}", e),
        )
    })?;

    stream
        .send(Message::Text(identify.into()))
        .await
        .map_err(|e| {
            failure(
                ConnectFailure::Unreachable,
                format!("failed to send Identify: {}", e),
            )
        })?;

    let identified: Identified = next_handshake_frame(&mut stream, OpCode::Identified).await?;

    debug!(
        negotiated_rpc_version = identified.negotiated_rpc_version,
        "Identified"
    );

    Ok(stream)
}

/// Read the next protocol frame during the handshake and require `expected`.
async fn next_handshake_frame<T>(stream: &mut WsStream, expected: OpCode) -> CoreResult<T>
where
    T: serde::de::DeserializeOwned,
{
    let failure = |kind: ConnectFailure, cause: String| ReplayError::Connection {
        kind,
        cause,
        location: ErrorLocation::from(Location::caller()),
    };

    loop {
        let message = match stream.next().await {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                return Err(failure(
                    ConnectFailure::Unreachable,
                    format!("connection error during handshake: {}", e),
                ));
            }
            None => {
                return Err(failure(
                    ConnectFailure::Unreachable,
                    "connection closed during handshake".to_string(),
                ));
            }
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(frame) => {
                let code = frame.as_ref().map(|f| u16::from(f.code));
                let kind = match code {
                    Some(CLOSE_AUTHENTICATION_FAILED) => ConnectFailure::AuthRejected,
                    Some(CLOSE_UNSUPPORTED_RPC_VERSION) => ConnectFailure::ProtocolMismatch,
                    _ => ConnectFailure::Unreachable,
                };
                return Err(failure(
                    kind,
                    format!(
                        "OBS closed the connection{}",
                        describe_close(frame.as_ref())
                    ),
                ));
            }
            Message::Ping(_) | Message::Pong(_) => continue,
            other => {
                return Err(failure(
                    ConnectFailure::ProtocolMismatch,
                    format!("unexpected {} frame during handshake", frame_kind(&other)),
                ));
            }
        };

        let frame: RawFrame = serde_json::from_str(text.as_str()).map_err(|e| {
            failure(
                ConnectFailure::ProtocolMismatch,
                format!("not an obs-websocket message: {}", e),
            )
        })?;

        if frame.opcode() != Some(expected) {
            return Err(failure(
                ConnectFailure::ProtocolMismatch,
                format!("expected opcode {}, got {}", expected as u8, frame.op),
            ));
        }

        return frame.payload().map_err(|e| {
            failure(
                ConnectFailure::ProtocolMismatch,
                format!("malformed opcode {} payload: {}", expected as u8, e),
            )
        });
    }
}

fn describe_close(frame: Option<&CloseFrame>) -> String {
    match frame {
        Some(frame) if !frame.reason.is_empty() => {
            format!(" (code {}: {})", u16::from(frame.code), frame.reason.as_str())
        }
        Some(frame) => format!(" (code {})", u16::from(frame.code)),
        None => String::new(),
    }
}

fn frame_kind(message: &Message) -> &'static str {
    match message {
        Message::Text(_) => "text",
        Message::Binary(_) => "binary",
        Message::Ping(_) => "ping",
        Message::Pong(_) => "pong",
        Message::Close(_) => "close",
        Message::Frame(_) => "raw",
    }
}
