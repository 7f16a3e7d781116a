//! Fake collaborators shared by the integration tests.
//!
//! The fake directory and fake remoting client write into one shared call
//! log so tests can assert on ordering across both.
//!
//! Tests CAN use `.unwrap()` and `.expect()` - this is allowed.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use txlink_client::directory::DirectoryError;
use txlink_client::{
    ClientHandler, ProcessorRegistry, RemotingClient, RemotingError, Session, SessionDirectory,
    SessionRef, TransportError,
};
use txlink_core::{ClientConfig, SessionKey};
use txlink_protocol::{FrameType, MessageType, RpcMessage, TypedBody};

// ============================================================================
// Call Log
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Register(SessionKey),
    Release(SessionKey),
    SendRequest(MessageType),
    Send(SessionKey, FrameType),
}

#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<Call>>,
}

impl CallLog {
    pub fn push(&self, call: Call) {
        self.calls.lock().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn releases_of(&self, key: &SessionKey) -> usize {
        self.count(|c| matches!(c, Call::Release(k) if k == key))
    }

    pub fn probes_to(&self, key: &SessionKey) -> usize {
        self.count(|c| matches!(c, Call::Send(k, FrameType::HeartbeatRequest) if k == key))
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| pred(c)).count()
    }
}

// ============================================================================
// Fake Session
// ============================================================================

pub struct FakeSession {
    key: SessionKey,
    closed: AtomicBool,
    fail_writes: AtomicBool,
    written: Mutex<Vec<RpcMessage>>,
}

impl FakeSession {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            key: SessionKey::new(name),
            closed: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            written: Mutex::new(Vec::new()),
        })
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn written(&self) -> Vec<RpcMessage> {
        self.written.lock().clone()
    }
}

impl fmt::Debug for FakeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeSession({})", self.key)
    }
}

#[async_trait]
impl Session for FakeSession {
    fn key(&self) -> &SessionKey {
        &self.key
    }

    fn stat(&self) -> String {
        self.key.to_string()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    async fn write_message(&self, message: &RpcMessage) -> Result<(), TransportError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TransportError::io(std::io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        self.written.lock().push(message.clone());
        Ok(())
    }
}

pub fn session_ref(session: &Arc<FakeSession>) -> SessionRef {
    session.clone()
}

// ============================================================================
// Fake Directory
// ============================================================================

pub struct FakeDirectory {
    log: Arc<CallLog>,
    sessions: Mutex<Vec<SessionRef>>,
    register_error: Mutex<Option<DirectoryError>>,
}

impl FakeDirectory {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            sessions: Mutex::new(Vec::new()),
            register_error: Mutex::new(None),
        }
    }

    /// Makes every later `register` fail with `error`.
    pub fn fail_registrations(&self, error: DirectoryError) {
        *self.register_error.lock() = Some(error);
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.lock().iter().any(|s| s.key() == key)
    }
}

#[async_trait]
impl SessionDirectory for FakeDirectory {
    async fn register(&self, session: SessionRef) -> Result<(), DirectoryError> {
        self.log.push(Call::Register(session.key().clone()));
        if let Some(error) = self.register_error.lock().clone() {
            return Err(error);
        }
        let mut sessions = self.sessions.lock();
        if !sessions.iter().any(|s| s.key() == session.key()) {
            sessions.push(session);
        }
        Ok(())
    }

    async fn release(&self, session_key: &SessionKey) -> Result<bool, DirectoryError> {
        self.log.push(Call::Release(session_key.clone()));
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|s| s.key() != session_key);
        Ok(sessions.len() != before)
    }

    async fn sessions(&self) -> Vec<SessionRef> {
        self.sessions.lock().clone()
    }
}

// ============================================================================
// Fake Remoting Client
// ============================================================================

/// Records sends; heartbeat results follow a script, then a default.
pub struct FakeRemoting {
    log: Arc<CallLog>,
    fail_requests: AtomicBool,
    heartbeat_script: Mutex<VecDeque<bool>>,
    heartbeat_default_ok: AtomicBool,
    heartbeat_delay: Mutex<Option<Duration>>,
    requests: Mutex<Vec<TypedBody>>,
    sent: Mutex<Vec<RpcMessage>>,
}

impl FakeRemoting {
    pub fn new(log: Arc<CallLog>) -> Self {
        Self {
            log,
            fail_requests: AtomicBool::new(false),
            heartbeat_script: Mutex::new(VecDeque::new()),
            heartbeat_default_ok: AtomicBool::new(true),
            heartbeat_delay: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn fail_requests(&self) {
        self.fail_requests.store(true, Ordering::SeqCst);
    }

    pub fn fail_heartbeats(&self) {
        self.heartbeat_default_ok.store(false, Ordering::SeqCst);
    }

    /// Makes each heartbeat send wait before reporting its outcome.
    pub fn delay_heartbeats(&self, delay: Duration) {
        *self.heartbeat_delay.lock() = Some(delay);
    }

    /// Queues heartbeat outcomes (`true` = send succeeds).
    pub fn script_heartbeats(&self, outcomes: &[bool]) {
        self.heartbeat_script.lock().extend(outcomes.iter().copied());
    }

    pub fn requests(&self) -> Vec<TypedBody> {
        self.requests.lock().clone()
    }

    pub fn sent(&self) -> Vec<RpcMessage> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl RemotingClient for FakeRemoting {
    async fn send_async_request(&self, body: TypedBody) -> Result<(), RemotingError> {
        self.log.push(Call::SendRequest(body.type_code));
        self.requests.lock().push(body);
        if self.fail_requests.load(Ordering::SeqCst) {
            return Err(RemotingError::NoAvailableSession);
        }
        Ok(())
    }

    async fn send_async(
        &self,
        message: RpcMessage,
        session: &SessionRef,
    ) -> Result<(), RemotingError> {
        self.log
            .push(Call::Send(session.key().clone(), message.frame_type));
        self.sent.lock().push(message);

        let delay = *self.heartbeat_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let ok = self
            .heartbeat_script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.heartbeat_default_ok.load(Ordering::SeqCst));
        if ok {
            Ok(())
        } else {
            Err(RemotingError::Transport(TransportError::WriteTimeout))
        }
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub log: Arc<CallLog>,
    pub directory: Arc<FakeDirectory>,
    pub remoting: Arc<FakeRemoting>,
    pub handler: ClientHandler,
}

pub fn test_config(max_retries: u32) -> ClientConfig {
    let mut config = ClientConfig::new("order-service", "default_tx_group");
    config.heartbeat.max_retries = max_retries;
    config
}

pub fn harness(max_retries: u32, processors: ProcessorRegistry) -> Harness {
    let log = Arc::new(CallLog::default());
    let directory = Arc::new(FakeDirectory::new(Arc::clone(&log)));
    let remoting = Arc::new(FakeRemoting::new(Arc::clone(&log)));
    let handler = ClientHandler::new(
        test_config(max_retries),
        processors,
        directory.clone(),
        remoting.clone(),
    );
    Harness {
        log,
        directory,
        remoting,
        handler,
    }
}
