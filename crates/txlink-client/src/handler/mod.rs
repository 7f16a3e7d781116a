//! Session event handler for the client side of a coordinator link.
//!
//! `ClientHandler` receives every transport event and:
//! - Registers sessions on open and announces the client with a
//!   registration handshake sent from a separate task
//! - Releases sessions on error and close
//! - Routes inbound frames to the processor registered for their type
//! - Sends a heartbeat probe on every cron tick and releases the session
//!   once the retry budget is spent
//!
//! # Panic-Free Guarantees
//!
//! No callback returns an error or panics. Failures are logged and turn
//! into session releases where the session can no longer be trusted.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use txlink_core::{ClientConfig, IdGenerator};
use txlink_protocol::{RegisterTmRequest, RpcMessage, TypedBody};

use crate::directory::{DirectoryError, SessionDirectory};
use crate::error::{HandshakeError, RemotingError, TransportError};
use crate::listener::EventListener;
use crate::processor::ProcessorRegistry;
use crate::remoting::RemotingClient;
use crate::session::SessionRef;

mod dispatch;
mod heartbeat;

pub use dispatch::DispatchOutcome;
pub use heartbeat::{
    FailureOutcome, HeartbeatRefused, HeartbeatSlot, HeartbeatState, HeartbeatTracker,
};

/// Handle to a running registration handshake.
pub type HandshakeTask = JoinHandle<Result<(), HandshakeError>>;

/// Event handler for client sessions.
///
/// Built once at startup; the processor registry it receives is frozen
/// from then on.
pub struct ClientHandler {
    config: Arc<ClientConfig>,
    ids: IdGenerator,
    processors: Arc<ProcessorRegistry>,
    heartbeat: HeartbeatTracker,
    directory: Arc<dyn SessionDirectory>,
    remoting: Arc<dyn RemotingClient>,
}

impl ClientHandler {
    /// Creates a handler.
    ///
    /// # Arguments
    ///
    /// * `config` - Client identity and heartbeat budget
    /// * `processors` - Processors by message type; read-only from here on
    /// * `directory` - Where open sessions are registered
    /// * `remoting` - Outbound sends for the handshake and heartbeats
    pub fn new(
        config: ClientConfig,
        processors: ProcessorRegistry,
        directory: Arc<dyn SessionDirectory>,
        remoting: Arc<dyn RemotingClient>,
    ) -> Self {
        let heartbeat = HeartbeatTracker::new(config.heartbeat.max_retries);
        Self {
            config: Arc::new(config),
            ids: IdGenerator::new(),
            processors: Arc::new(processors),
            heartbeat,
            directory,
            remoting,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn processors(&self) -> &ProcessorRegistry {
        &self.processors
    }

    pub fn heartbeat(&self) -> &HeartbeatTracker {
        &self.heartbeat
    }

    /// Identifier of the most recent heartbeat probe (0 if none yet).
    pub fn last_probe_id(&self) -> u32 {
        self.ids.current()
    }

    /// Registers a new session and starts its registration handshake.
    ///
    /// The session is in the directory before the handshake task is
    /// spawned. The task releases and closes the session itself if the
    /// handshake cannot be sent; the returned handle reports the outcome.
    pub async fn open_session(&self, session: &SessionRef) -> Result<HandshakeTask, DirectoryError> {
        info!(session = %session.stat(), "Open new session");
        self.directory.register(Arc::clone(session)).await?;

        let request = RegisterTmRequest::new(
            self.config.protocol_version.clone(),
            self.config.application_id.clone(),
            self.config.tx_service_group.clone(),
        );
        let remoting = Arc::clone(&self.remoting);
        let directory = Arc::clone(&self.directory);
        let session = Arc::clone(session);

        Ok(tokio::spawn(async move {
            let result = send_registration(remoting.as_ref(), &request).await;

            if let Err(e) = &result {
                error!(session = %session.stat(), error = %e, "Registration handshake failed");
                if let Err(e) = directory.release(session.key()).await {
                    warn!(session = %session.stat(), error = %e, "Failed to release session");
                }
                session.close();
            } else {
                debug!(
                    session = %session.stat(),
                    application_id = %request.application_id,
                    "Registration handshake sent"
                );
            }

            result
        }))
    }

    /// Sends one heartbeat probe on `session`.
    pub async fn send_heartbeat(&self, session: &SessionRef) -> Result<(), RemotingError> {
        let probe = RpcMessage::heartbeat_request(self.ids.next_id());
        self.remoting.send_async(probe, session).await
    }

    /// Runs one heartbeat cycle for `session`.
    ///
    /// The heartbeat slot is held across the send and the failure count, so a
    /// tick that overlaps an unfinished one for the same session is skipped.
    async fn heartbeat_tick(&self, session: &SessionRef) {
        if session.is_closed() {
            debug!(session = %session.stat(), "Session closed, skipping heartbeat");
            return;
        }

        let slot = match self.heartbeat.begin_heartbeat(session.key()) {
            Ok(slot) => slot,
            Err(HeartbeatRefused::Evicted) => {
                debug!(session = %session.stat(), "Session evicted, skipping heartbeat");
                return;
            }
            Err(HeartbeatRefused::InFlight) => {
                debug!(session = %session.stat(), "Previous heartbeat still in flight, skipping");
                return;
            }
        };

        let Err(e) = self.send_heartbeat(session).await else {
            return;
        };
        warn!(session = %session.stat(), error = %e, "Failed to send heartbeat");

        let outcome = slot.record_failure();
        drop(slot);

        match outcome {
            FailureOutcome::Degraded(retries) => {
                debug!(
                    session = %session.stat(),
                    retries,
                    max_retries = self.heartbeat.max_retries(),
                    "Heartbeat retry recorded"
                );
            }
            FailureOutcome::Evicted => {
                warn!(
                    session = %session.stat(),
                    max_retries = self.heartbeat.max_retries(),
                    "Heartbeat retries exhausted, releasing session"
                );
                self.release(session).await;
                session.close();
            }
            FailureOutcome::AlreadyEvicted => {}
        }
    }

    async fn release(&self, session: &SessionRef) {
        if let Err(e) = self.directory.release(session.key()).await {
            warn!(session = %session.stat(), error = %e, "Failed to release session");
        }
    }
}

async fn send_registration(
    remoting: &dyn RemotingClient,
    request: &RegisterTmRequest,
) -> Result<(), HandshakeError> {
    let body = TypedBody::from_message(request)?;
    remoting.send_async_request(body).await?;
    Ok(())
}

#[async_trait]
impl EventListener for ClientHandler {
    async fn on_open(&self, session: &SessionRef) {
        // The handshake task reports its own failure
        if let Err(e) = self.open_session(session).await {
            error!(session = %session.stat(), error = %e, "Failed to register session, closing");
            self.heartbeat.clear(session.key());
            self.release(session).await;
            session.close();
        }
    }

    async fn on_error(&self, session: &SessionRef, error: TransportError) {
        info!(session = %session.stat(), error = %error, "Session got error, will be closed");
        self.heartbeat.clear(session.key());
        self.release(session).await;
    }

    async fn on_close(&self, session: &SessionRef) {
        info!(session = %session.stat(), "Session is closing");
        self.heartbeat.clear(session.key());
        self.release(session).await;
    }

    async fn on_message(&self, session: &SessionRef, frame: serde_json::Value) {
        self.dispatch(session, frame).await;
    }

    async fn on_cron(&self, session: &SessionRef) {
        debug!(session = %session.stat(), "Cron tick");
        self.heartbeat_tick(session).await;
    }
}
