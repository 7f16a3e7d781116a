//! Session directory using the Actor pattern.
//!
//! The directory tracks which transport sessions are currently open so
//! that outbound requests can find one. It receives commands via a tokio
//! mpsc channel and publishes changes on a broadcast channel.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌──────────────────┐
//! │  ClientHandler  │────▶│ DirectoryActor  │────▶│ Broadcast Channel│
//! └─────────────────┘     └─────────────────┘     └──────────────────┘
//!         │                       │                       │
//!         │  DirectoryCommand     │  DirectoryEvent       │
//!         ▼                       ▼                       ▼
//!   Register/Release       HashMap<SessionKey,      Subscribers
//!                          SessionRef>
//! ```

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use txlink_core::SessionKey;

use crate::session::SessionRef;

mod actor;
mod commands;
mod handle;

pub use actor::{DirectoryActor, MAX_SESSIONS};
pub use commands::{DirectoryCommand, DirectoryError, DirectoryEvent};
pub use handle::DirectoryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 100;

/// Registry of open sessions.
///
/// Both mutations must be idempotent: registering a known session or
/// releasing an unknown one is not an error.
#[async_trait]
pub trait SessionDirectory: Send + Sync {
    /// Adds a session.
    async fn register(&self, session: SessionRef) -> Result<(), DirectoryError>;

    /// Removes a session. Returns `false` if it was not registered.
    async fn release(&self, session_key: &SessionKey) -> Result<bool, DirectoryError>;

    /// Lists open sessions, oldest first.
    async fn sessions(&self) -> Vec<SessionRef>;
}

/// Spawn the directory actor and return a handle for interaction.
///
/// # Example
///
/// ```no_run
/// use txlink_client::directory::{spawn_directory, SessionDirectory};
///
/// #[tokio::main]
/// async fn main() {
///     let directory = spawn_directory();
///     let sessions = directory.sessions().await;
///     assert!(sessions.is_empty());
/// }
/// ```
pub fn spawn_directory() -> DirectoryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = DirectoryActor::new(cmd_rx, event_tx.clone());
    tokio::spawn(actor.run());

    DirectoryHandle::new(cmd_tx, event_tx)
}
