//! txlink - client link to a transaction coordinator
//!
//! Connects once to a coordinator, announces this client with a
//! registration handshake, routes inbound messages to the built-in
//! processors and keeps the link alive with heartbeats.
//!
//! # Usage
//!
//! ```bash
//! # Connect over TCP using the default config file
//! txlink --connect 127.0.0.1:8091
//!
//! # Connect over a Unix socket with an explicit config
//! txlink --config ./client.toml --connect unix:/run/coordinator.sock
//!
//! # Enable debug logging
//! RUST_LOG=txlink_client=debug txlink --connect 127.0.0.1:8091
//! ```
//!
//! # Signal Handling
//!
//! - SIGTERM/SIGINT: Graceful shutdown

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use txlink_client::directory::spawn_directory;
use txlink_client::{
    ClientHandler, CloseReason, ProcessorRegistry, SessionDirectory, StreamRemotingClient,
    StreamTransport,
};
use txlink_core::ClientConfig;

/// txlink - transaction coordinator client link
#[derive(Parser, Debug)]
#[command(name = "txlink", version, about)]
struct Args {
    /// Path to the client config file
    #[arg(short, long, env = "TXLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Coordinator address: `host:port`, `tcp:host:port` or `unix:/path`
    #[arg(long, env = "TXLINK_CONNECT")]
    connect: String,
}

/// Where to reach the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
}

impl Endpoint {
    fn parse(raw: &str) -> Result<Self> {
        if let Some(path) = raw.strip_prefix("unix:") {
            if path.is_empty() {
                bail!("Empty Unix socket path in '{raw}'");
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        let addr = raw.strip_prefix("tcp:").unwrap_or(raw);
        if !addr.contains(':') {
            bail!("Expected host:port, got '{raw}'");
        }
        Ok(Self::Tcp(addr.to_string()))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let endpoint = Endpoint::parse(&args.connect)?;

    let config_path = args.config.unwrap_or_else(ClientConfig::default_path);
    let config = ClientConfig::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    run_client(config, endpoint)
}

/// Runs the client (async entry point).
#[tokio::main]
async fn run_client(config: ClientConfig, endpoint: Endpoint) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("txlink_client=info".parse()?)
                .add_directive("txlink_core=info".parse()?)
                .add_directive("txlink_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        application_id = %config.application_id,
        tx_service_group = %config.tx_service_group,
        "txlink starting"
    );

    let cancel_token = CancellationToken::new();

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");
        shutdown_token.cancel();
    });

    // Composition root: every collaborator is built here and injected
    let directory: Arc<dyn SessionDirectory> = Arc::new(spawn_directory());
    let remoting = Arc::new(StreamRemotingClient::new(Arc::clone(&directory)));
    let heartbeat_interval = config.heartbeat.interval();
    let handler = Arc::new(ClientHandler::new(
        config,
        ProcessorRegistry::with_builtins(),
        directory,
        remoting,
    ));
    let transport = StreamTransport::new(handler, heartbeat_interval, cancel_token);

    let reason = match &endpoint {
        Endpoint::Tcp(addr) => {
            let stream = tokio::net::TcpStream::connect(addr)
                .await
                .with_context(|| format!("Failed to connect to {addr}"))?;
            let (reader, writer) = stream.into_split();
            transport.serve(reader, writer, addr.clone()).await
        }
        Endpoint::Unix(path) => {
            let stream = connect_unix(path).await?;
            let (reader, writer) = stream.into_split();
            transport
                .serve(reader, writer, path.display().to_string())
                .await
        }
    };

    match reason {
        CloseReason::Error(e) => {
            error!(error = %e, "Connection failed");
            Err(e.into())
        }
        other => {
            info!(reason = ?other, "txlink stopped");
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn connect_unix(path: &std::path::Path) -> Result<tokio::net::UnixStream> {
    tokio::net::UnixStream::connect(path)
        .await
        .with_context(|| format!("Failed to connect to {}", path.display()))
}

#[cfg(not(unix))]
async fn connect_unix(_path: &std::path::Path) -> Result<tokio::net::TcpStream> {
    bail!("Unix sockets are only supported on Unix systems");
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_parse() {
        assert_eq!(
            Endpoint::parse("127.0.0.1:8091").unwrap(),
            Endpoint::Tcp("127.0.0.1:8091".to_string())
        );
        assert_eq!(
            Endpoint::parse("tcp:coordinator:8091").unwrap(),
            Endpoint::Tcp("coordinator:8091".to_string())
        );
        assert_eq!(
            Endpoint::parse("unix:/run/tc.sock").unwrap(),
            Endpoint::Unix(PathBuf::from("/run/tc.sock"))
        );
        assert!(Endpoint::parse("unix:").is_err());
        assert!(Endpoint::parse("nohost").is_err());
    }
}
