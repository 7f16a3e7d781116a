//! Directory actor - owns the set of open sessions and processes commands.
//!
//! # Panic-Free Guarantees
//!
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - Response send failures are ignored (the caller went away)

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use txlink_core::SessionKey;

use super::commands::{DirectoryCommand, DirectoryError, DirectoryEvent};
use crate::session::SessionRef;

/// Maximum number of sessions the directory can hold.
pub const MAX_SESSIONS: usize = 64;

struct Entry {
    session: SessionRef,
    registered_at: DateTime<Utc>,
    /// Registration order, used to keep listings stable
    seq: u64,
}

/// The directory actor.
///
/// Runs in a single task and processes commands sequentially, so
/// concurrent releases of the same session are serialised and the second
/// one is a no-op.
pub struct DirectoryActor {
    receiver: mpsc::Receiver<DirectoryCommand>,
    sessions: HashMap<SessionKey, Entry>,
    next_seq: u64,
    event_publisher: broadcast::Sender<DirectoryEvent>,
}

impl DirectoryActor {
    /// Creates a new directory actor.
    pub fn new(
        receiver: mpsc::Receiver<DirectoryCommand>,
        event_publisher: broadcast::Sender<DirectoryEvent>,
    ) -> Self {
        Self {
            receiver,
            sessions: HashMap::new(),
            next_seq: 0,
            event_publisher,
        }
    }

    /// Runs the actor until every sender has been dropped.
    pub async fn run(mut self) {
        info!("Session directory starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(sessions = self.sessions.len(), "Session directory stopped");
    }

    fn handle_command(&mut self, cmd: DirectoryCommand) {
        match cmd {
            DirectoryCommand::Register {
                session,
                respond_to,
            } => {
                let result = self.handle_register(session);
                let _ = respond_to.send(result);
            }
            DirectoryCommand::Release {
                session_key,
                respond_to,
            } => {
                let released = self.handle_release(session_key);
                let _ = respond_to.send(released);
            }
            DirectoryCommand::Get {
                session_key,
                respond_to,
            } => {
                let session = self
                    .sessions
                    .get(&session_key)
                    .map(|entry| entry.session.clone());
                let _ = respond_to.send(session);
            }
            DirectoryCommand::List { respond_to } => {
                let _ = respond_to.send(self.ordered_sessions());
            }
        }
    }

    fn handle_register(&mut self, session: SessionRef) -> Result<(), DirectoryError> {
        let key = session.key().clone();

        if let Some(entry) = self.sessions.get_mut(&key) {
            debug!(session = %key, "Session already registered, refreshing handle");
            entry.session = session;
            return Ok(());
        }

        if self.sessions.len() >= MAX_SESSIONS {
            warn!(session = %key, max = MAX_SESSIONS, "Session directory full");
            return Err(DirectoryError::DirectoryFull { max: MAX_SESSIONS });
        }

        let now = Utc::now();
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);
        self.sessions.insert(
            key.clone(),
            Entry {
                session,
                registered_at: now,
                seq,
            },
        );

        debug!(session = %key, total = self.sessions.len(), "Session registered");
        self.publish(DirectoryEvent::Registered {
            session_key: key,
            at: now,
        });
        Ok(())
    }

    fn handle_release(&mut self, key: SessionKey) -> bool {
        match self.sessions.remove(&key) {
            Some(entry) => {
                let held_for = Utc::now().signed_duration_since(entry.registered_at);
                debug!(
                    session = %key,
                    held_ms = held_for.num_milliseconds(),
                    total = self.sessions.len(),
                    "Session released"
                );
                self.publish(DirectoryEvent::Released {
                    session_key: key,
                    at: Utc::now(),
                });
                true
            }
            None => {
                debug!(session = %key, "Release of unknown session ignored");
                false
            }
        }
    }

    fn ordered_sessions(&self) -> Vec<SessionRef> {
        let mut entries: Vec<&Entry> = self.sessions.values().collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
            .into_iter()
            .map(|entry| entry.session.clone())
            .collect()
    }

    fn publish(&self, event: DirectoryEvent) {
        // No subscribers is fine
        let _ = self.event_publisher.send(event);
    }
}
