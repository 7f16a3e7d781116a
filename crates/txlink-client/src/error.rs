//! Error types for transport, remoting and handshake failures.
//!
//! None of these escape the event callbacks: the handler logs them and
//! reacts by releasing the affected session.

use std::io;

use thiserror::Error;

use txlink_protocol::CodecError;

use crate::directory::DirectoryError;

/// Errors raised by a transport session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Session is closed")]
    Closed,

    #[error("I/O error ({kind:?}): {message}")]
    Io { kind: io::ErrorKind, message: String },

    #[error("Write timeout")]
    WriteTimeout,

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

impl TransportError {
    /// Builds an I/O error with an explicit kind.
    pub fn io(kind: io::ErrorKind, message: impl Into<String>) -> Self {
        Self::Io {
            kind,
            message: message.into(),
        }
    }

    /// The underlying I/O error kind, if this is an I/O failure.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Self::Io { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        Self::io(e.kind(), e.to_string())
    }
}

/// Errors raised by outbound sends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemotingError {
    #[error("No open session available")]
    NoAvailableSession,

    #[error("Session {0} is closed")]
    SessionClosed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Errors from the registration handshake.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    #[error("Failed to send registration: {0}")]
    Send(#[from] RemotingError),

    #[error("Failed to encode registration: {0}")]
    Encode(#[from] CodecError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),
}
