//! The RPC envelope and its framing metadata.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::CodecError;
use crate::payload::{HeartBeatMessage, MessageTypeAware};
use crate::types::MessageType;

/// Transport-level framing of an envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FrameType {
    Request = 0,
    Response = 1,
    RequestOneway = 2,
    HeartbeatRequest = 3,
    HeartbeatResponse = 4,
}

impl FrameType {
    /// Returns true for heartbeat request/response framing.
    pub fn is_heartbeat(self) -> bool {
        matches!(self, Self::HeartbeatRequest | Self::HeartbeatResponse)
    }
}

impl TryFrom<u8> for FrameType {
    type Error = UnknownTag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Request),
            1 => Ok(Self::Response),
            2 => Ok(Self::RequestOneway),
            3 => Ok(Self::HeartbeatRequest),
            4 => Ok(Self::HeartbeatResponse),
            other => Err(UnknownTag { kind: "frame type", value: other }),
        }
    }
}

impl From<FrameType> for u8 {
    fn from(t: FrameType) -> Self {
        t as u8
    }
}

/// Serialization codec identifier carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CodecType {
    #[default]
    Seata = 0x1,
    Protobuf = 0x2,
    Kryo = 0x4,
    Fst = 0x8,
    Json = 0x10,
}

impl TryFrom<u8> for CodecType {
    type Error = UnknownTag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x1 => Ok(Self::Seata),
            0x2 => Ok(Self::Protobuf),
            0x4 => Ok(Self::Kryo),
            0x8 => Ok(Self::Fst),
            0x10 => Ok(Self::Json),
            other => Err(UnknownTag { kind: "codec", value: other }),
        }
    }
}

impl From<CodecType> for u8 {
    fn from(t: CodecType) -> Self {
        t as u8
    }
}

/// Compressor identifier carried in the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CompressorType {
    #[default]
    None = 0,
    Gzip = 1,
    Zip = 2,
    Sevenz = 3,
    Bzip2 = 4,
    Lz4 = 5,
    Deflate = 6,
    Zstd = 7,
}

impl TryFrom<u8> for CompressorType {
    type Error = UnknownTag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Zip),
            3 => Ok(Self::Sevenz),
            4 => Ok(Self::Bzip2),
            5 => Ok(Self::Lz4),
            6 => Ok(Self::Deflate),
            7 => Ok(Self::Zstd),
            other => Err(UnknownTag { kind: "compressor", value: other }),
        }
    }
}

impl From<CompressorType> for u8 {
    fn from(t: CompressorType) -> Self {
        t as u8
    }
}

/// An envelope tag outside the known range.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Unknown {kind} tag: {value}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: u8,
}

/// A body that declares its logical message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedBody {
    /// Logical message type used for processor routing
    pub type_code: MessageType,

    /// Type-specific fields
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TypedBody {
    /// Creates a body with an explicit type and raw payload.
    pub fn new(type_code: MessageType, payload: serde_json::Value) -> Self {
        Self { type_code, payload }
    }

    /// Wraps a concrete payload, taking its declared type.
    pub fn from_message<M>(message: &M) -> Result<Self, CodecError>
    where
        M: MessageTypeAware + Serialize,
    {
        let payload =
            serde_json::to_value(message).map_err(|e| CodecError::Encode(e.to_string()))?;
        Ok(Self {
            type_code: message.type_code(),
            payload,
        })
    }

    /// Decodes the payload as a concrete message.
    pub fn decode<M: DeserializeOwned>(&self) -> Result<M, CodecError> {
        serde_json::from_value(self.payload.clone()).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

impl MessageTypeAware for TypedBody {
    fn type_code(&self) -> MessageType {
        self.type_code
    }
}

/// Envelope body: either type-aware or an opaque document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    /// Body declaring a logical type
    Typed(TypedBody),

    /// Body without a type declaration; cannot be routed
    Untyped(serde_json::Value),
}

impl MessageBody {
    /// Returns the type-aware view of the body, if it declares a type.
    pub fn as_type_aware(&self) -> Option<&dyn MessageTypeAware> {
        match self {
            Self::Typed(body) => Some(body),
            Self::Untyped(_) => None,
        }
    }

    /// Returns the typed body, if any.
    pub fn typed(&self) -> Option<&TypedBody> {
        match self {
            Self::Typed(body) => Some(body),
            Self::Untyped(_) => None,
        }
    }
}

impl From<TypedBody> for MessageBody {
    fn from(body: TypedBody) -> Self {
        Self::Typed(body)
    }
}

/// The outer envelope for every message on a coordinator link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcMessage {
    /// Identifier; only meaningful for messages this side originated
    #[serde(default)]
    pub id: u32,

    /// Transport framing
    pub frame_type: FrameType,

    /// Codec tag
    #[serde(default)]
    pub codec: CodecType,

    /// Compressor tag
    #[serde(default)]
    pub compressor: CompressorType,

    /// Payload
    pub body: MessageBody,
}

impl RpcMessage {
    /// Creates an envelope with default codec and no compression.
    pub fn new(id: u32, frame_type: FrameType, body: MessageBody) -> Self {
        Self {
            id,
            frame_type,
            codec: CodecType::default(),
            compressor: CompressorType::None,
            body,
        }
    }

    /// Creates a request envelope around a typed body.
    pub fn request(id: u32, body: TypedBody) -> Self {
        Self::new(id, FrameType::Request, MessageBody::Typed(body))
    }

    /// Creates a heartbeat probe envelope.
    pub fn heartbeat_request(id: u32) -> Self {
        Self::new(
            id,
            FrameType::HeartbeatRequest,
            MessageBody::Typed(HeartBeatMessage::PING.into()),
        )
    }

    /// Interprets a decoded document as an envelope.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CodecError> {
        serde_json::from_value(value).map_err(|e| CodecError::NotAnEnvelope(e.to_string()))
    }

    /// Returns the declared logical type, if the body is type-aware.
    pub fn message_type(&self) -> Option<MessageType> {
        self.body.as_type_aware().map(|b| b.type_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heartbeat_request_shape() {
        let msg = RpcMessage::heartbeat_request(9);
        let value = serde_json::to_value(&msg).unwrap();

        assert_eq!(value["id"], 9);
        assert_eq!(value["frame_type"], 3);
        assert_eq!(value["codec"], 1);
        assert_eq!(value["compressor"], 0);
        assert_eq!(value["body"]["type_code"], 120);
        assert_eq!(value["body"]["payload"]["ping"], true);
    }

    #[test]
    fn test_untyped_body_is_not_type_aware() {
        let msg = RpcMessage::from_value(json!({
            "frame_type": 0,
            "body": { "anything": "goes" }
        }))
        .unwrap();

        assert!(msg.body.as_type_aware().is_none());
        assert_eq!(msg.message_type(), None);
    }

    #[test]
    fn test_unknown_type_code_still_typed() {
        let msg = RpcMessage::from_value(json!({
            "frame_type": 0,
            "body": { "type_code": 4242, "payload": {} }
        }))
        .unwrap();

        assert_eq!(msg.message_type(), Some(MessageType::Other(4242)));
    }

    #[test]
    fn test_non_envelope_rejected() {
        assert!(RpcMessage::from_value(json!("just a string")).is_err());
        assert!(RpcMessage::from_value(json!({ "body": {} })).is_err());
        assert!(RpcMessage::from_value(json!({ "frame_type": 99, "body": {} })).is_err());
    }

    #[test]
    fn test_decode_typed_payload() {
        let body = TypedBody::from_message(&HeartBeatMessage::PONG).unwrap();
        let decoded: HeartBeatMessage = body.decode().unwrap();
        assert_eq!(decoded, HeartBeatMessage::PONG);
        assert_eq!(body.type_code(), MessageType::HeartbeatMsg);
    }
}
