//! txlink Client - session router and liveness manager
//!
//! This crate sits between a bidirectional message transport and the
//! per-message-type processors of a transaction client:
//! - `handler` - Session lifecycle, inbound dispatch and heartbeat
//! - `processor` - Processor trait, registry and built-in processors
//! - `directory` - Session directory actor tracking open sessions
//! - `remoting` - Fire-and-forget outbound sends
//! - `transport` - Newline-delimited JSON stream transport
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐  open/error/close   ┌─────────────────────────────┐
//! │ StreamTransport │  message/cron       │        ClientHandler        │
//! │  (per stream)   │────────────────────▶│ lifecycle · dispatch · beat │
//! └────────┬────────┘                     └──────┬───────────────┬──────┘
//!          │ write                               │               │
//!          │                 register/release    ▼               ▼
//!          │                        ┌─────────────────┐ ┌─────────────────┐
//!          └────────────────────────│ DirectoryHandle │ │ProcessorRegistry│
//!            StreamRemotingClient   │ (actor)         │ │ (frozen)        │
//!                                   └─────────────────┘ └─────────────────┘
//! ```
//!
//! # Panic-Free Guarantees
//!
//! All production code in this crate follows the panic-free policy:
//! - No `.unwrap()`, `.expect()`, `panic!()`, `unreachable!()`, `todo!()`
//! - All fallible operations return `Result` or `Option`
//! - Malformed input is logged and dropped, never propagated

pub mod directory;
pub mod error;
pub mod handler;
pub mod listener;
pub mod processor;
pub mod remoting;
pub mod session;
pub mod transport;

pub use directory::{spawn_directory, DirectoryHandle, SessionDirectory};
pub use error::{HandshakeError, RemotingError, TransportError};
pub use handler::{ClientHandler, HeartbeatState, HeartbeatTracker};
pub use listener::EventListener;
pub use processor::{ProcessContext, ProcessorRegistry, RemotingProcessor};
pub use remoting::{RemotingClient, StreamRemotingClient};
pub use session::{Session, SessionRef};
pub use transport::{CloseReason, StreamSession, StreamTransport};
