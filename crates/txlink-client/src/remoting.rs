//! Outbound fire-and-forget sends.
//!
//! Delivery is confirmed only at the send level: `Ok` means the envelope
//! was written to a session, not that the coordinator acted on it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use txlink_core::IdGenerator;
use txlink_protocol::{RpcMessage, TypedBody};

use crate::directory::SessionDirectory;
use crate::error::RemotingError;
use crate::session::SessionRef;

/// Outbound side of the link.
#[async_trait]
pub trait RemotingClient: Send + Sync {
    /// Sends a request over any open session.
    async fn send_async_request(&self, body: TypedBody) -> Result<(), RemotingError>;

    /// Sends a prepared envelope over a specific session.
    async fn send_async(&self, message: RpcMessage, session: &SessionRef)
        -> Result<(), RemotingError>;
}

/// Remoting client that writes straight onto directory sessions.
///
/// Requests go to the oldest open session; there is no load balancing.
pub struct StreamRemotingClient {
    directory: Arc<dyn SessionDirectory>,
    ids: IdGenerator,
}

impl StreamRemotingClient {
    pub fn new(directory: Arc<dyn SessionDirectory>) -> Self {
        Self {
            directory,
            ids: IdGenerator::new(),
        }
    }

    async fn pick_session(&self) -> Option<SessionRef> {
        self.directory
            .sessions()
            .await
            .into_iter()
            .find(|session| !session.is_closed())
    }
}

#[async_trait]
impl RemotingClient for StreamRemotingClient {
    async fn send_async_request(&self, body: TypedBody) -> Result<(), RemotingError> {
        let session = self
            .pick_session()
            .await
            .ok_or(RemotingError::NoAvailableSession)?;

        let message = RpcMessage::request(self.ids.next_id(), body);
        debug!(
            session = %session.stat(),
            id = message.id,
            message_type = ?message.message_type(),
            "Sending request"
        );
        self.send_async(message, &session).await
    }

    async fn send_async(
        &self,
        message: RpcMessage,
        session: &SessionRef,
    ) -> Result<(), RemotingError> {
        if session.is_closed() {
            return Err(RemotingError::SessionClosed(session.stat()));
        }
        session.write_message(&message).await?;
        Ok(())
    }
}
