//! Directory actor commands, errors, and events.
//!
//! This module defines the message types for communicating with the `DirectoryActor`:
//! - `DirectoryCommand`: Commands sent to the actor
//! - `DirectoryError`: Errors that can occur during directory operations
//! - `DirectoryEvent`: Events published by the directory for subscribers

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::oneshot;

use txlink_core::SessionKey;

use crate::session::SessionRef;

// ============================================================================
// Directory Commands
// ============================================================================

/// Commands sent to the directory actor.
///
/// Each command carries a oneshot channel for the response.
#[derive(Debug)]
pub enum DirectoryCommand {
    /// Add a session, or refresh it if the key is already present.
    ///
    /// # Errors
    /// - `DirectoryError::DirectoryFull` if at maximum capacity
    Register {
        session: SessionRef,
        respond_to: oneshot::Sender<Result<(), DirectoryError>>,
    },

    /// Remove a session. Responds `false` if the key was not present.
    Release {
        session_key: SessionKey,
        respond_to: oneshot::Sender<bool>,
    },

    /// Look up a single session.
    Get {
        session_key: SessionKey,
        respond_to: oneshot::Sender<Option<SessionRef>>,
    },

    /// List sessions in registration order.
    List {
        respond_to: oneshot::Sender<Vec<SessionRef>>,
    },
}

// ============================================================================
// Directory Errors
// ============================================================================

/// Errors that can occur during directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Directory is at maximum capacity
    #[error("Session directory is full (max: {max})")]
    DirectoryFull { max: usize },

    /// Actor channel closed (actor has shut down)
    #[error("Directory channel closed")]
    ChannelClosed,
}

// ============================================================================
// Directory Events
// ============================================================================

/// Events published when the set of open sessions changes.
#[derive(Debug, Clone)]
pub enum DirectoryEvent {
    /// A session was added
    Registered {
        session_key: SessionKey,
        at: DateTime<Utc>,
    },

    /// A session was removed
    Released {
        session_key: SessionKey,
        at: DateTime<Utc>,
    },
}

impl DirectoryEvent {
    /// The key of the session this event concerns.
    pub fn session_key(&self) -> &SessionKey {
        match self {
            Self::Registered { session_key, .. } | Self::Released { session_key, .. } => {
                session_key
            }
        }
    }
}
