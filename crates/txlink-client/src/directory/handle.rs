//! Client interface for interacting with the DirectoryActor.
//!
//! # Panic-Free Guarantees
//!
//! Channel errors are mapped to `DirectoryError::ChannelClosed` or to an
//! empty answer; nothing here panics.

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};

use txlink_core::SessionKey;

use super::commands::{DirectoryCommand, DirectoryError, DirectoryEvent};
use super::SessionDirectory;
use crate::session::SessionRef;

/// Cheap-to-clone handle for the directory actor.
#[derive(Clone)]
pub struct DirectoryHandle {
    sender: mpsc::Sender<DirectoryCommand>,
    event_sender: broadcast::Sender<DirectoryEvent>,
}

impl DirectoryHandle {
    /// Create a new directory handle.
    pub fn new(
        sender: mpsc::Sender<DirectoryCommand>,
        event_sender: broadcast::Sender<DirectoryEvent>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Get a single session by key.
    ///
    /// Returns `None` if the session is unknown or the actor is gone.
    pub async fn get(&self, session_key: SessionKey) -> Option<SessionRef> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(DirectoryCommand::Get {
                session_key,
                respond_to: tx,
            })
            .await
            .ok()?;

        rx.await.ok()?
    }

    /// Number of registered sessions (0 if the actor is gone).
    pub async fn len(&self) -> usize {
        SessionDirectory::sessions(self).await.len()
    }

    /// Returns true if no sessions are registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Subscribe to directory events.
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.event_sender.subscribe()
    }

    /// Returns true while the actor is running.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}

#[async_trait]
impl SessionDirectory for DirectoryHandle {
    async fn register(&self, session: SessionRef) -> Result<(), DirectoryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(DirectoryCommand::Register {
                session,
                respond_to: tx,
            })
            .await
            .map_err(|_| DirectoryError::ChannelClosed)?;

        rx.await.map_err(|_| DirectoryError::ChannelClosed)?
    }

    async fn release(&self, session_key: &SessionKey) -> Result<bool, DirectoryError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(DirectoryCommand::Release {
                session_key: session_key.clone(),
                respond_to: tx,
            })
            .await
            .map_err(|_| DirectoryError::ChannelClosed)?;

        rx.await.map_err(|_| DirectoryError::ChannelClosed)
    }

    async fn sessions(&self) -> Vec<SessionRef> {
        let (tx, rx) = oneshot::channel();

        if self
            .sender
            .send(DirectoryCommand::List { respond_to: tx })
            .await
            .is_err()
        {
            return Vec::new();
        }

        rx.await.unwrap_or_default()
    }
}
