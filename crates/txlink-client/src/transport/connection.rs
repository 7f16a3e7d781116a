//! Per-connection event loop.
//!
//! Reads frames on a dedicated task (so a tick never interrupts a partial
//! read) and turns them, together with the heartbeat ticker, into listener
//! events for one session.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use txlink_protocol::{decode_frame, CodecError, MAX_FRAME_SIZE};

use super::session::StreamSession;
use crate::error::TransportError;
use crate::listener::EventListener;
use crate::session::{Session, SessionRef};

/// Buffered frames between the reader task and the event loop
const READ_BUFFER: usize = 64;

/// Most bytes read for one line; anything longer is already oversized
const LINE_READ_LIMIT: u64 = MAX_FRAME_SIZE as u64 + 1;

/// Why a connection loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the stream
    Eof,

    /// Read or decode failure
    Error(TransportError),

    /// Session was closed locally (eviction, failed handshake)
    Closed,

    /// Transport-wide shutdown
    Cancelled,
}

enum ReadEvent {
    Line(String),
    Eof,
    Failed(TransportError),
}

/// Drives one connection until it ends.
pub(crate) struct Connection {
    session: Arc<StreamSession>,
    listener: Arc<dyn EventListener>,
    heartbeat_interval: Duration,
    shutdown: CancellationToken,
}

impl Connection {
    pub(crate) fn new(
        session: Arc<StreamSession>,
        listener: Arc<dyn EventListener>,
        heartbeat_interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            session,
            listener,
            heartbeat_interval,
            shutdown,
        }
    }

    pub(crate) async fn run<R>(self, reader: R) -> CloseReason
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let session: SessionRef = self.session.clone();
        let (line_tx, mut line_rx) = mpsc::channel(READ_BUFFER);
        let reader_task = tokio::spawn(read_lines(BufReader::new(reader), line_tx));

        self.listener.on_open(&session).await;

        let mut ticker = interval_at(
            Instant::now() + self.heartbeat_interval,
            self.heartbeat_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    break CloseReason::Cancelled;
                }

                _ = self.session.close_token().cancelled() => {
                    break CloseReason::Closed;
                }

                _ = ticker.tick() => {
                    self.listener.on_cron(&session).await;
                }

                event = line_rx.recv() => {
                    match event {
                        Some(ReadEvent::Line(line)) => match decode_frame(&line) {
                            Ok(frame) => self.listener.on_message(&session, frame).await,
                            Err(CodecError::EmptyFrame) => {}
                            Err(e) => {
                                let error = TransportError::from(e);
                                self.listener.on_error(&session, error.clone()).await;
                                break CloseReason::Error(error);
                            }
                        },
                        Some(ReadEvent::Failed(error)) => {
                            self.listener.on_error(&session, error.clone()).await;
                            break CloseReason::Error(error);
                        }
                        Some(ReadEvent::Eof) | None => {
                            debug!(session = %session.stat(), "Peer sent EOF");
                            break CloseReason::Eof;
                        }
                    }
                }
            }
        };

        reader_task.abort();
        self.session.close();
        self.session.shutdown().await;
        self.listener.on_close(&session).await;

        info!(session = %session.stat(), reason = ?reason, "Connection ended");
        reason
    }
}

async fn read_lines<R>(mut reader: BufReader<R>, sender: mpsc::Sender<ReadEvent>)
where
    R: AsyncRead + Unpin,
{
    loop {
        let mut line = String::new();
        // Bounded so a peer that never sends a newline cannot grow the buffer
        let event = match (&mut reader).take(LINE_READ_LIMIT).read_line(&mut line).await {
            Ok(0) => ReadEvent::Eof,
            Ok(_) if line.len() > MAX_FRAME_SIZE => {
                ReadEvent::Failed(TransportError::Codec(CodecError::FrameTooLarge {
                    size: line.len(),
                    max: MAX_FRAME_SIZE,
                }))
            }
            Ok(_) => ReadEvent::Line(line),
            Err(e) => ReadEvent::Failed(TransportError::from(e)),
        };

        let last = !matches!(event, ReadEvent::Line(_));
        if sender.send(event).await.is_err() || last {
            return;
        }
    }
}
