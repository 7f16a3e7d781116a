//! Event delivery seam between a transport and the router.

use async_trait::async_trait;

use crate::error::TransportError;
use crate::session::SessionRef;

/// Receives the events a transport produces for each session.
///
/// Events for one session are delivered in order. Events for different
/// sessions, and cron ticks relative to messages, may overlap.
#[async_trait]
pub trait EventListener: Send + Sync {
    /// A connection was established.
    async fn on_open(&self, session: &SessionRef);

    /// The transport hit an error on this session.
    async fn on_error(&self, session: &SessionRef, error: TransportError);

    /// The connection closed.
    async fn on_close(&self, session: &SessionRef);

    /// One decoded frame arrived.
    async fn on_message(&self, session: &SessionRef, frame: serde_json::Value);

    /// Periodic liveness tick.
    async fn on_cron(&self, session: &SessionRef);
}
