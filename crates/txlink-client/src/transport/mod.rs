//! Newline-delimited JSON stream transport.
//!
//! Turns any reader/writer pair (Unix socket, TCP stream, in-memory
//! duplex) into the event sequence an [`EventListener`] expects:
//!
//! ```text
//! on_open ─▶ (on_message | on_cron)* ─▶ [on_error] ─▶ on_close
//! ```
//!
//! - One `on_message` per non-empty line that parses as JSON
//! - `on_cron` every heartbeat interval, first tick one interval after open
//! - `on_error` for I/O failures, oversized lines and undecodable JSON;
//!   the connection then ends
//! - `on_close` exactly once, after EOF, error, local close or shutdown
//!
//! Connection establishment and reconnection are left to the caller.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;

use txlink_core::SessionKey;

use crate::listener::EventListener;

mod connection;
mod session;

pub use connection::CloseReason;
pub use session::StreamSession;

use connection::Connection;

/// Serves stream connections to one listener.
pub struct StreamTransport {
    listener: Arc<dyn EventListener>,
    heartbeat_interval: Duration,
    cancel_token: CancellationToken,
    connection_counter: AtomicU64,
}

impl StreamTransport {
    /// Creates a transport.
    ///
    /// # Arguments
    ///
    /// * `listener` - Receives every session event
    /// * `heartbeat_interval` - Period of `on_cron` ticks
    /// * `cancel_token` - Ends all connections when cancelled
    pub fn new(
        listener: Arc<dyn EventListener>,
        heartbeat_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            listener,
            heartbeat_interval,
            cancel_token,
            connection_counter: AtomicU64::new(0),
        }
    }

    /// Runs one connection to completion.
    ///
    /// Returns when the peer disconnects, the session is closed locally,
    /// an error occurs, or the transport is cancelled.
    pub async fn serve<R, W>(&self, reader: R, writer: W, peer: impl Into<String>) -> CloseReason
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (_session, connection) = self.prepare(writer, peer);
        connection.run(reader).await
    }

    /// Starts one connection and returns its session immediately.
    ///
    /// The connection runs on its own task; await the handle for the
    /// close reason.
    pub fn spawn<R, W>(
        &self,
        reader: R,
        writer: W,
        peer: impl Into<String>,
    ) -> (Arc<StreamSession>, tokio::task::JoinHandle<CloseReason>)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (session, connection) = self.prepare(writer, peer);
        let handle = tokio::spawn(connection.run(reader));
        (session, handle)
    }

    fn prepare<W>(&self, writer: W, peer: impl Into<String>) -> (Arc<StreamSession>, Connection)
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let number = self.connection_counter.fetch_add(1, Ordering::Relaxed);
        let session = Arc::new(StreamSession::new(
            SessionKey::from_connection(number),
            peer,
            Box::new(writer),
            CancellationToken::new(),
        ));
        let connection = Connection::new(
            Arc::clone(&session),
            Arc::clone(&self.listener),
            self.heartbeat_interval,
            self.cancel_token.clone(),
        );
        (session, connection)
    }
}
