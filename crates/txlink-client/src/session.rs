//! The transport session seam.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use txlink_core::SessionKey;
use txlink_protocol::RpcMessage;

use crate::error::TransportError;

/// Shared handle to a transport session.
pub type SessionRef = Arc<dyn Session>;

/// One transport connection, owned by the transport layer.
///
/// The router only borrows sessions; it keeps no per-session state past
/// the close notification.
#[async_trait]
pub trait Session: Send + Sync + fmt::Debug {
    /// Stable key for the lifetime of this connection.
    fn key(&self) -> &SessionKey;

    /// Human-readable identity for logging.
    fn stat(&self) -> String;

    /// True once the session has been closed by either side.
    fn is_closed(&self) -> bool;

    /// Requests teardown of the underlying connection.
    fn close(&self);

    /// Writes one envelope to the peer.
    async fn write_message(&self, message: &RpcMessage) -> Result<(), TransportError>;
}
