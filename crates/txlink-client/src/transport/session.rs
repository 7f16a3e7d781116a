//! Session backed by the write half of a byte stream.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use txlink_core::SessionKey;
use txlink_protocol::{encode_frame, RpcMessage};

use crate::error::TransportError;
use crate::session::Session;

/// Write timeout (10 seconds)
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A transport session writing newline-delimited JSON frames.
pub struct StreamSession {
    key: SessionKey,
    peer: String,
    opened_at: DateTime<Utc>,
    writer: Mutex<BufWriter<BoxedWriter>>,
    closed: AtomicBool,
    /// Cancelled on close; stops the connection driver
    close_token: CancellationToken,
}

impl StreamSession {
    pub(crate) fn new(
        key: SessionKey,
        peer: impl Into<String>,
        writer: BoxedWriter,
        close_token: CancellationToken,
    ) -> Self {
        Self {
            key,
            peer: peer.into(),
            opened_at: Utc::now(),
            writer: Mutex::new(BufWriter::new(writer)),
            closed: AtomicBool::new(false),
            close_token,
        }
    }

    /// Address or label of the remote end.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    pub(crate) fn close_token(&self) -> &CancellationToken {
        &self.close_token
    }

    /// Flushes and shuts down the write half.
    pub(crate) async fn shutdown(&self) {
        let mut writer = self.writer.lock().await;
        if let Err(e) = writer.shutdown().await {
            debug!(session = %self.key, error = %e, "Failed to shut down writer");
        }
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("key", &self.key)
            .field("peer", &self.peer)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[async_trait]
impl Session for StreamSession {
    fn key(&self) -> &SessionKey {
        &self.key
    }

    fn stat(&self) -> String {
        let age = Utc::now().signed_duration_since(self.opened_at);
        format!(
            "{} peer={} age={}s{}",
            self.key,
            self.peer,
            age.num_seconds(),
            if self.is_closed() { " closed" } else { "" }
        )
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(session = %self.key, "Closing session");
        }
        self.close_token.cancel();
    }

    async fn write_message(&self, message: &RpcMessage) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let line = encode_frame(message)?;
        let mut writer = self.writer.lock().await;

        match timeout(WRITE_TIMEOUT, async {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await?;
            Ok::<(), std::io::Error>(())
        })
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TransportError::from(e)),
            Err(_) => Err(TransportError::WriteTimeout),
        }
    }
}
