//! Concrete payloads exchanged on the client side of the link.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::message::TypedBody;
use crate::types::MessageType;

/// A payload capable of declaring its own logical message type.
pub trait MessageTypeAware {
    /// The logical type used to select a processor.
    fn type_code(&self) -> MessageType;
}

/// Heartbeat probe (ping) or reply (pong).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartBeatMessage {
    pub ping: bool,
}

impl HeartBeatMessage {
    pub const PING: HeartBeatMessage = HeartBeatMessage { ping: true };
    pub const PONG: HeartBeatMessage = HeartBeatMessage { ping: false };
}

impl MessageTypeAware for HeartBeatMessage {
    fn type_code(&self) -> MessageType {
        MessageType::HeartbeatMsg
    }
}

impl From<HeartBeatMessage> for TypedBody {
    fn from(msg: HeartBeatMessage) -> Self {
        TypedBody::new(msg.type_code(), json!({ "ping": msg.ping }))
    }
}

/// Transaction manager registration, sent once per opened session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTmRequest {
    /// Protocol version tag of this client
    pub version: String,

    /// Local application identity
    pub application_id: String,

    /// Transaction service group this client belongs to
    pub transaction_service_group: String,

    /// Free-form extension data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_data: Option<String>,
}

impl RegisterTmRequest {
    pub fn new(
        version: impl Into<String>,
        application_id: impl Into<String>,
        transaction_service_group: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            application_id: application_id.into(),
            transaction_service_group: transaction_service_group.into(),
            extra_data: None,
        }
    }
}

impl MessageTypeAware for RegisterTmRequest {
    fn type_code(&self) -> MessageType {
        MessageType::RegClt
    }
}

/// Outcome code of a coordinator response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultCode {
    Failed,
    Success,
}

/// Coordinator's answer to [`RegisterTmRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTmResponse {
    pub result_code: ResultCode,

    /// Whether the coordinator accepted the client identity
    #[serde(default)]
    pub identified: bool,

    /// Coordinator protocol version tag
    #[serde(default)]
    pub version: String,

    /// Human-readable detail, usually set on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl RegisterTmResponse {
    /// True when the coordinator accepted the registration.
    pub fn is_accepted(&self) -> bool {
        self.result_code == ResultCode::Success && self.identified
    }
}

impl MessageTypeAware for RegisterTmResponse {
    fn type_code(&self) -> MessageType {
        MessageType::RegCltResult
    }
}
