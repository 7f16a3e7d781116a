//! txlink Protocol - Wire types for coordinator links
//!
//! This crate provides the envelope, logical message types, concrete
//! payloads and the newline-delimited JSON codec exchanged between a
//! transaction client and the coordination service.

pub mod codec;
pub mod message;
pub mod payload;
pub mod types;
pub mod version;

pub use codec::{decode_frame, encode_frame, CodecError, MAX_FRAME_SIZE};
pub use message::{CodecType, CompressorType, FrameType, MessageBody, RpcMessage, TypedBody};
pub use payload::{
    HeartBeatMessage, MessageTypeAware, RegisterTmRequest, RegisterTmResponse, ResultCode,
};
pub use types::MessageType;
pub use version::ProtocolVersion;
