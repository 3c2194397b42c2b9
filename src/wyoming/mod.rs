//! Just enough of the Wyoming protocol to follow a satellite: a JSON header
//! line per event, optionally followed by extra JSON data and a binary
//! payload, which we skip.

use std::{
    path::PathBuf,
    str::FromStr,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use anyhow::{anyhow, Context, Error};
use log::{debug, error, info};
use serde::Deserialize;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader},
    net::{TcpListener, UnixListener},
    sync::mpsc,
    time::sleep,
};

use crate::event::LifecycleEvent;

/// Longest header line we accept
const MAX_HEADER_LEN: usize = 64 * 1024;
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Where the service listens
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerUri {
    Unix(PathBuf),
    Tcp(String),
}

impl FromStr for ServerUri {
    type Err = Error;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        if let Some(path) = uri.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(anyhow!("missing socket path in {uri:?}"));
            }
            Ok(ServerUri::Unix(PathBuf::from(path)))
        } else if let Some(address) = uri.strip_prefix("tcp://") {
            if !address.contains(':') {
                return Err(anyhow!("missing port in {uri:?}"));
            }
            Ok(ServerUri::Tcp(address.to_string()))
        } else {
            Err(anyhow!("unsupported URI {uri:?}, expected unix:// or tcp://"))
        }
    }
}

/// The parts of an event header we care about
#[derive(Debug, Deserialize, PartialEq)]
pub struct EventHeader {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data_length: Option<usize>,
    #[serde(default)]
    pub payload_length: Option<usize>,
}

/// Read the next event, skipping its data and payload. `None` at end of
/// stream.
pub async fn read_event<R>(reader: &mut R) -> Result<Option<EventHeader>, Error>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = (&mut *reader)
        .take(MAX_HEADER_LEN as u64)
        .read_line(&mut line)
        .await
        .context("failed to read event header")?;
    if read == 0 {
        return Ok(None);
    }
    if !line.ends_with('\n') && read == MAX_HEADER_LEN {
        return Err(anyhow!("event header longer than {MAX_HEADER_LEN} bytes"));
    }

    let header: EventHeader = serde_json::from_str(line.trim_end())
        .with_context(|| format!("invalid event header {:?}", line.trim_end()))?;

    let skip = header
        .data_length
        .unwrap_or(0)
        .checked_add(header.payload_length.unwrap_or(0))
        .ok_or_else(|| anyhow!("{} event body is too long", header.kind))?;
    if skip > 0 {
        let mut body = (&mut *reader).take(skip as u64);
        let skipped = tokio::io::copy(&mut body, &mut tokio::io::sink())
            .await
            .context("failed to skip event body")?;
        if skipped < skip as u64 {
            return Err(anyhow!("stream ended inside a {} event", header.kind));
        }
    }

    Ok(Some(header))
}

/// Forward the lifecycle events from one connection until it closes
pub async fn handle_connection<R>(
    stream: R,
    events: mpsc::Sender<LifecycleEvent>,
) -> Result<(), Error>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);

    while let Some(header) = read_event(&mut reader).await? {
        match LifecycleEvent::from_wire(&header.kind) {
            Some(event) => {
                debug!("Event: {}", event);
                if events.send(event).await.is_err() {
                    // The engine is gone, nobody is listening any more
                    break;
                }
            }
            None => debug!("Ignoring {} event", header.kind),
        }
    }

    Ok(())
}

/// Accept satellites on `uri` forever, feeding all their events into one
/// queue
pub async fn serve(uri: ServerUri, events: mpsc::Sender<LifecycleEvent>) -> Result<(), Error> {
    static CLIENTS: AtomicU64 = AtomicU64::new(0);

    match uri {
        ServerUri::Unix(path) => {
            // Make sure a stale socket from a previous run doesn't block us
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("failed to remove {}", path.display()))?;
            }

            let listener = UnixListener::bind(&path)
                .with_context(|| format!("failed to bind {}", path.display()))?;
            info!("Listening on unix://{}", path.display());

            loop {
                let stream = match listener.accept().await {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        accept_failed(e).await;
                        continue;
                    }
                };
                let client = CLIENTS.fetch_add(1, Ordering::Relaxed);
                spawn_client(client, stream, events.clone());
            }
        }
        ServerUri::Tcp(address) => {
            let listener = TcpListener::bind(&address)
                .await
                .with_context(|| format!("failed to bind {address}"))?;
            info!("Listening on tcp://{}", address);

            loop {
                let (stream, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(e) => {
                        accept_failed(e).await;
                        continue;
                    }
                };
                let client = CLIENTS.fetch_add(1, Ordering::Relaxed);
                debug!("Client {} is {}", client, peer);
                spawn_client(client, stream, events.clone());
            }
        }
    }
}

/// A failed accept only costs that one client. Back off briefly so running
/// out of file descriptors doesn't spin.
async fn accept_failed(e: std::io::Error) {
    error!("Failed to accept a client: {}", e);
    sleep(ACCEPT_BACKOFF).await;
}

fn spawn_client<R>(client: u64, stream: R, events: mpsc::Sender<LifecycleEvent>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    debug!("Client connected: {}", client);
    tokio::spawn(async move {
        match handle_connection(stream, events).await {
            Ok(()) => debug!("Client disconnected: {}", client),
            Err(e) => error!("Client {}: {:#}", client, e),
        }
    });
}
