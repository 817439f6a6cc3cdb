//! obs-websocket v5 message shapes.
//!
//! Every frame is a JSON object `{ "op": <opcode>, "d": <payload> }`. Only the
//! messages needed for identify + request/response are modelled.

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// RPC version this client negotiates.
pub(crate) const RPC_VERSION: u32 = 1;

/// WebSocket close code sent when identification fails authentication.
pub(crate) const CLOSE_AUTHENTICATION_FAILED: u16 = 4009;

/// WebSocket close code sent when the requested RPC version is unsupported.
pub(crate) const CLOSE_UNSUPPORTED_RPC_VERSION: u16 = 4010;

/// Message opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OpCode {
    Hello = 0,
    Identify = 1,
    Identified = 2,
    Event = 5,
    Request = 6,
    RequestResponse = 7,
}

impl OpCode {
    pub(crate) fn from_u8(op: u8) -> Option<Self> {
        match op {
            0 => Some(OpCode::Hello),
            1 => Some(OpCode::Identify),
            2 => Some(OpCode::Identified),
            5 => Some(OpCode::Event),
            6 => Some(OpCode::Request),
            7 => Some(OpCode::RequestResponse),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope<T> {
    pub op: u8,
    pub d: T,
}

/// A frame whose payload has not been interpreted yet.
#[derive(Debug, Deserialize)]
pub(crate) struct RawFrame {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
}

impl RawFrame {
    pub(crate) fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }

    pub(crate) fn payload<T: DeserializeOwned>(self) -> serde_json::Result<T> {
        serde_json::from_value(self.d)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Hello {
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Identify {
    pub rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Identified {
    pub negotiated_rpc_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Request {
    pub request_type: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RequestStatus {
    /// Describe a failed status for the user.
    pub(crate) fn describe(&self) -> String {
        match &self.comment {
            Some(comment) if !comment.is_empty() => format!("code {}: {}", self.code, comment),
            _ => format!("code {}", self.code),
        }
    }
}

/// Serialize `payload` under `op`.
pub(crate) fn encode<T: Serialize>(op: OpCode, payload: T) -> serde_json::Result<String> {
    serde_json::to_string(&Envelope { op: op as u8, d: payload })
}

/// Compute the identify authentication string.
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub(crate) fn authentication_string(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{}{}", password, salt).as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{}{}", secret, challenge).as_bytes()))
}
