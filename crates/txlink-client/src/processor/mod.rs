//! Processor trait and the message-type registry.
//!
//! The registry is filled through `&mut` access before it is handed to the
//! [`ClientHandler`](crate::ClientHandler) inside an `Arc`; from then on it
//! is read-only and shared by every callback without locking.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use txlink_core::SessionKey;
use txlink_protocol::{MessageType, RpcMessage};

mod builtin;

pub use builtin::{HeartbeatProcessor, RegisterResultProcessor};

/// Context handed to a processor alongside the message.
#[derive(Debug, Clone)]
pub struct ProcessContext {
    /// Session the message arrived on
    pub session: SessionKey,

    /// Printable session identity
    pub session_stat: String,

    /// When the frame was dispatched
    pub received_at: DateTime<Utc>,
}

impl ProcessContext {
    pub fn new(session: SessionKey, session_stat: String) -> Self {
        Self {
            session,
            session_stat,
            received_at: Utc::now(),
        }
    }
}

/// Business reaction to one logical message type.
///
/// Called inline from the dispatcher; implementations own their error
/// handling and must not assume they will be retried.
#[async_trait]
pub trait RemotingProcessor: Send + Sync + 'static {
    async fn process(&self, ctx: &ProcessContext, message: RpcMessage);
}

/// Mapping from logical message type to its processor.
///
/// One processor per type; a later registration replaces an earlier one.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<MessageType, Arc<dyn RemotingProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in heartbeat and registration
    /// result processors.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_processor(MessageType::HeartbeatMsg, HeartbeatProcessor)
            .register_processor(MessageType::RegCltResult, RegisterResultProcessor);
        registry
    }

    /// Registers a processor for `message_type`.
    ///
    /// `None` is ignored. Returns `&mut Self` for method chaining.
    pub fn register(
        &mut self,
        message_type: MessageType,
        processor: Option<Arc<dyn RemotingProcessor>>,
    ) -> &mut Self {
        if let Some(processor) = processor {
            self.processors.insert(message_type, processor);
        }
        self
    }

    /// Registers a concrete processor. Returns `&mut Self` for method chaining.
    pub fn register_processor<P: RemotingProcessor>(
        &mut self,
        message_type: MessageType,
        processor: P,
    ) -> &mut Self {
        self.register(message_type, Some(Arc::new(processor)))
    }

    /// Returns the processor for `message_type`, if any.
    pub fn lookup(&self, message_type: MessageType) -> Option<Arc<dyn RemotingProcessor>> {
        self.processors.get(&message_type).cloned()
    }

    pub fn contains(&self, message_type: MessageType) -> bool {
        self.processors.contains_key(&message_type)
    }

    /// Registered types, sorted by wire code.
    pub fn message_types(&self) -> Vec<MessageType> {
        let mut types: Vec<MessageType> = self.processors.keys().copied().collect();
        types.sort_by_key(|t| t.code());
        types
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl std::fmt::Debug for ProcessorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorRegistry")
            .field("message_types", &self.message_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(Arc<AtomicUsize>);

    #[async_trait]
    impl RemotingProcessor for Counting {
        async fn process(&self, _ctx: &ProcessContext, _message: RpcMessage) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn ctx() -> ProcessContext {
        ProcessContext::new(SessionKey::new("session-0"), "test".to_string())
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let mut registry = ProcessorRegistry::new();
        registry
            .register_processor(MessageType::BranchCommit, Counting(Arc::clone(&first)))
            .register_processor(MessageType::BranchCommit, Counting(Arc::clone(&second)));

        assert_eq!(registry.len(), 1);
        let processor = registry.lookup(MessageType::BranchCommit).unwrap();
        processor
            .process(&ctx(), RpcMessage::heartbeat_request(1))
            .await;

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_none_is_ignored() {
        let mut registry = ProcessorRegistry::new();
        registry.register(MessageType::BranchRollback, None);
        assert!(registry.is_empty());
        assert!(registry.lookup(MessageType::BranchRollback).is_none());
    }

    #[test]
    fn test_none_does_not_clear_existing() {
        let mut registry = ProcessorRegistry::new();
        registry
            .register_processor(MessageType::BranchRollback, HeartbeatProcessor)
            .register(MessageType::BranchRollback, None);
        assert!(registry.contains(MessageType::BranchRollback));
    }

    #[test]
    fn test_builtins() {
        let registry = ProcessorRegistry::with_builtins();
        assert_eq!(
            registry.message_types(),
            vec![MessageType::RegCltResult, MessageType::HeartbeatMsg]
        );
    }
}
