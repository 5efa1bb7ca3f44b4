//! Registration ingest service.
//!
//! Peers report their full content inventory by opening a TCP connection
//! and writing newline-separated identifiers, then closing their write
//! side. The host address recorded for the batch is the connection's
//! observed source address, never anything the payload claims; "who
//! sent this" is anchored to the transport layer.
//!
//! Connections are served one at a time on a dedicated task, so a slow
//! upload never starves query handling; the store's write lock keeps
//! each replace atomic relative to concurrent selects.

use crate::error::{DirectoryError, Result};
use crate::server::DirectoryMetrics;
use locator_core::{
    clamp_ingest_payload, parse_inventory, RelationStore, INGEST_ACK, MAX_INGEST_BYTES,
};
use locator_types::HostAddress;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;

/// TCP listener accepting inventory uploads.
pub struct IngestService {
    listener: TcpListener,
    store: Arc<RwLock<RelationStore>>,
    read_timeout: Duration,
    metrics: Arc<DirectoryMetrics>,
}

impl IngestService {
    /// Bind the registration listener.
    ///
    /// Failure to bind is fatal configuration, reported as
    /// [`DirectoryError::Bind`].
    pub async fn bind(
        addr: SocketAddr,
        store: Arc<RwLock<RelationStore>>,
        read_timeout: Duration,
        metrics: Arc<DirectoryMetrics>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| DirectoryError::Bind { addr, source })?;
        Ok(Self::from_listener(listener, store, read_timeout, metrics))
    }

    /// Wrap an already-bound listener.
    pub fn from_listener(
        listener: TcpListener,
        store: Arc<RwLock<RelationStore>>,
        read_timeout: Duration,
        metrics: Arc<DirectoryMetrics>,
    ) -> Self {
        Self {
            listener,
            store,
            read_timeout,
            metrics,
        }
    }

    /// The address the listener actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve uploads forever, one connection at a time.
    pub async fn run(self) {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    tracing::warn!("accept failed: {e}");
                    continue;
                }
            };
            if let Err(e) = self.serve_connection(stream, peer).await {
                tracing::warn!(%peer, "registration failed: {e}");
            }
        }
    }

    async fn serve_connection(&self, mut stream: TcpStream, peer: SocketAddr) -> Result<()> {
        let payload = match tokio::time::timeout(self.read_timeout, read_upload(&mut stream)).await
        {
            Ok(payload) => payload?,
            Err(_) => {
                // Stalled peer: drop without touching the store.
                tracing::warn!(%peer, "upload stalled past deadline, dropping");
                return Ok(());
            }
        };

        let (bounded, truncated) = clamp_ingest_payload(&payload);
        if truncated {
            tracing::warn!(%peer, limit = MAX_INGEST_BYTES, "oversized upload truncated");
        }

        let keys = parse_inventory(bounded);
        let host = HostAddress::new(peer);
        tracing::info!(%host, keys = keys.len(), "registering inventory");

        {
            // Write lock: the replace is atomic relative to selects.
            let mut store = self.store.write().await;
            store.replace_host(host, keys);
        }
        self.metrics.registrations.fetch_add(1, Ordering::Relaxed);

        stream.write_all(INGEST_ACK).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

/// Drain an upload until the peer closes its write side.
///
/// At most one byte past [`MAX_INGEST_BYTES`] is retained (enough for the
/// clamp to detect overflow); the remainder is read and discarded so the
/// peer can finish writing and still observe the acknowledgement.
async fn read_upload(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        if payload.len() <= MAX_INGEST_BYTES {
            let keep = n.min(MAX_INGEST_BYTES + 1 - payload.len());
            payload.extend_from_slice(&buf[..keep]);
        }
    }
    Ok(payload)
}
