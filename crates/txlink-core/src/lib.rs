//! txlink Core - Shared types for coordinator links
//!
//! This crate provides the domain types shared between the wire
//! protocol (txlink-protocol) and the session router (txlink-client).
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

pub mod config;
pub mod id;
pub mod session;

// Re-exports for convenience
pub use config::{ClientConfig, ConfigError, HeartbeatConfig};
pub use id::IdGenerator;
pub use session::SessionKey;
