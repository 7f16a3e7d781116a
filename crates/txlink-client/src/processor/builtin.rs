//! Processors the client ships with.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use txlink_protocol::{
    HeartBeatMessage, MessageBody, ProtocolVersion, RegisterTmResponse, RpcMessage,
};

use super::{ProcessContext, RemotingProcessor};

/// Handles heartbeat replies from the coordinator.
///
/// Replies are only logged: liveness is tracked by send failures, not by
/// reply correlation.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeartbeatProcessor;

#[async_trait]
impl RemotingProcessor for HeartbeatProcessor {
    async fn process(&self, ctx: &ProcessContext, message: RpcMessage) {
        let ping = match &message.body {
            MessageBody::Typed(body) => body.decode::<HeartBeatMessage>().ok().map(|m| m.ping),
            MessageBody::Untyped(_) => None,
        };

        match ping {
            Some(false) => debug!(session = %ctx.session_stat, id = message.id, "Received heartbeat pong"),
            Some(true) => debug!(session = %ctx.session_stat, id = message.id, "Received heartbeat ping"),
            None => warn!(session = %ctx.session_stat, "Heartbeat body could not be decoded"),
        }
    }
}

/// Logs the coordinator's answer to the registration handshake.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegisterResultProcessor;

#[async_trait]
impl RemotingProcessor for RegisterResultProcessor {
    async fn process(&self, ctx: &ProcessContext, message: RpcMessage) {
        let Some(body) = message.body.typed() else {
            warn!(session = %ctx.session_stat, "Registration result without typed body");
            return;
        };

        let response: RegisterTmResponse = match body.decode() {
            Ok(response) => response,
            Err(e) => {
                warn!(session = %ctx.session_stat, error = %e, "Malformed registration result");
                return;
            }
        };

        if !response.is_accepted() {
            warn!(
                session = %ctx.session_stat,
                reason = response.msg.as_deref().unwrap_or("unspecified"),
                "Coordinator rejected registration"
            );
            return;
        }

        match ProtocolVersion::parse(&response.version) {
            Ok(version) if !version.is_compatible_with(&ProtocolVersion::CURRENT) => {
                warn!(
                    session = %ctx.session_stat,
                    coordinator_version = %version,
                    client_version = %ProtocolVersion::CURRENT,
                    "Registered with coordinator speaking an incompatible protocol version"
                );
            }
            Ok(version) => {
                info!(
                    session = %ctx.session_stat,
                    coordinator_version = %version,
                    "Registered with coordinator"
                );
            }
            Err(_) => {
                info!(session = %ctx.session_stat, "Registered with coordinator");
            }
        }
    }
}
