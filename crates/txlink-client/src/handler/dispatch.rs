//! Inbound frame routing.

use tracing::{debug, error};

use txlink_protocol::{MessageType, RpcMessage};

use super::ClientHandler;
use crate::processor::ProcessContext;
use crate::session::SessionRef;

/// What happened to one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Handed to the processor registered for this type
    Processed(MessageType),

    /// Frame was not an RPC envelope; dropped
    NotAnEnvelope,

    /// Envelope body declared no message type; dropped
    NotTypeAware,

    /// No processor registered for this type; dropped
    Unroutable(MessageType),
}

impl ClientHandler {
    /// Routes one decoded frame to its processor.
    ///
    /// Never fails: every malformed or unroutable frame is logged and
    /// dropped, and nothing is sent back to the peer.
    pub async fn dispatch(&self, session: &SessionRef, frame: serde_json::Value) -> DispatchOutcome {
        debug!(session = %session.stat(), "Received frame");

        let message = match RpcMessage::from_value(frame) {
            Ok(message) => message,
            Err(e) => {
                error!(session = %session.stat(), error = %e, "Received frame is not an RPC message");
                return DispatchOutcome::NotAnEnvelope;
            }
        };

        let Some(message_type) = message.message_type() else {
            error!(
                session = %session.stat(),
                id = message.id,
                body = ?message.body,
                "RPC message body does not declare a message type"
            );
            return DispatchOutcome::NotTypeAware;
        };

        let Some(processor) = self.processors().lookup(message_type) else {
            error!(
                session = %session.stat(),
                message_type = %message_type,
                "No processor registered for message type"
            );
            return DispatchOutcome::Unroutable(message_type);
        };

        let ctx = ProcessContext::new(session.key().clone(), session.stat());
        processor.process(&ctx, message).await;
        DispatchOutcome::Processed(message_type)
    }
}
