//! The directory client.
//!
//! Discovery and content-location queries go over the named-data
//! transport; the inventory announcement itself is a plain TCP upload to
//! whatever endpoint discovery returned. The directory records the
//! upload under the connection's source address, so the client never
//! states its own address anywhere.

use crate::inventory::{InventoryError, InventoryProvider};
use locator_core::INGEST_ACK;
use locator_transport::{SignedContent, Transport, TransportError};
use locator_types::{ContentKey, HostAddress, Name, NameError, SERVER_COMPONENT, WHERE_COMPONENT};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Errors from directory client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The named-data transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// No response arrived before the query deadline.
    #[error("no response within {after:?}")]
    Timeout {
        /// The deadline that elapsed.
        after: Duration,
    },

    /// An interest name could not be built.
    #[error("name error: {0}")]
    Name(#[from] NameError),

    /// The inventory source failed.
    #[error("inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// A self-location response did not parse as `<ip>:<port>`.
    #[error("malformed directory location {payload:?}")]
    MalformedLocation {
        /// The payload that failed to parse.
        payload: String,
    },

    /// The directory closed the upload connection without acknowledging.
    #[error("registration not acknowledged by {endpoint}")]
    NotAcknowledged {
        /// The upload endpoint that failed to acknowledge.
        endpoint: HostAddress,
    },

    /// The TCP upload failed.
    #[error("upload i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client for one directory prefix.
///
/// Cheap to clone via the shared transport; all methods take `&self`.
pub struct DirectoryClient {
    transport: Arc<dyn Transport>,
    base: Name,
    retry_delay: Duration,
    query_timeout: Duration,
    announce_interval: Option<Duration>,
}

impl DirectoryClient {
    /// Create a client for the directory serving `base`.
    pub fn new(transport: Arc<dyn Transport>, base: Name) -> Self {
        Self {
            transport,
            base,
            retry_delay: Duration::from_secs(1),
            query_timeout: Duration::from_secs(10),
            announce_interval: None,
        }
    }

    /// Deadline for each expressed interest.
    ///
    /// An interest may never be answered, so every query is bounded;
    /// expiry surfaces as [`ClientError::Timeout`].
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Delay before retrying after a failed announcement.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fix the re-announcement interval instead of following the
    /// directory's freshness hint.
    pub fn with_announce_interval(mut self, interval: Duration) -> Self {
        self.announce_interval = Some(interval);
        self
    }

    /// Express `interest` with the query deadline applied.
    async fn query(&self, interest: &Name) -> Result<SignedContent, ClientError> {
        match tokio::time::timeout(
            self.query_timeout,
            self.transport.express_interest(interest),
        )
        .await
        {
            Ok(content) => Ok(content?),
            Err(_) => Err(ClientError::Timeout {
                after: self.query_timeout,
            }),
        }
    }

    /// Ask the directory where it accepts inventory uploads.
    ///
    /// Returns the upload endpoint and the response's freshness hint,
    /// which doubles as the suggested re-announcement interval.
    pub async fn discover(&self) -> Result<(HostAddress, Option<u32>), ClientError> {
        let interest = self.base.child(SERVER_COMPONENT).with_nonce()?;
        let content = self.query(&interest).await?;

        let text = String::from_utf8_lossy(&content.payload);
        let endpoint = text
            .parse::<HostAddress>()
            .map_err(|_| ClientError::MalformedLocation {
                payload: text.into_owned(),
            })?;

        tracing::debug!(%endpoint, freshness = ?content.freshness_secs, "discovered directory");
        Ok((endpoint, content.freshness_secs))
    }

    /// Upload the current inventory to `endpoint`.
    ///
    /// Writes newline-separated keys, closes the write side, and waits
    /// for the directory's acknowledgement. An empty inventory is a
    /// valid upload and deregisters this node.
    pub async fn push_inventory(
        &self,
        endpoint: HostAddress,
        inventory: &dyn InventoryProvider,
    ) -> Result<usize, ClientError> {
        let keys = inventory.list().await?;

        let mut payload = String::new();
        for key in &keys {
            payload.push_str(key.as_str());
            payload.push('\n');
        }

        let mut stream = TcpStream::connect(endpoint.socket_addr()).await?;
        stream.write_all(payload.as_bytes()).await?;
        stream.shutdown().await?;

        let mut ack = Vec::new();
        stream.read_to_end(&mut ack).await?;
        if ack != INGEST_ACK {
            return Err(ClientError::NotAcknowledged { endpoint });
        }

        tracing::info!(%endpoint, keys = keys.len(), "inventory registered");
        Ok(keys.len())
    }

    /// Discover the directory and upload the current inventory.
    ///
    /// Returns the freshness hint from discovery so callers can schedule
    /// the next announcement.
    pub async fn announce(
        &self,
        inventory: &dyn InventoryProvider,
    ) -> Result<Option<u32>, ClientError> {
        let (endpoint, freshness) = self.discover().await?;
        self.push_inventory(endpoint, inventory).await?;
        Ok(freshness)
    }

    /// Announce forever, re-announcing each time the previous response
    /// goes stale.
    ///
    /// The interval is the directory's freshness hint (the registration
    /// outlives the response only until the next announcement lands)
    /// unless [`with_announce_interval`](Self::with_announce_interval)
    /// fixed one. Failures are logged and retried after the configured
    /// delay.
    pub async fn run_announce_loop(&self, inventory: &dyn InventoryProvider) {
        loop {
            match self.announce(inventory).await {
                Ok(freshness) => {
                    let interval = self.announce_interval.unwrap_or_else(|| {
                        Duration::from_secs(u64::from(freshness.unwrap_or(1).max(1)))
                    });
                    tokio::time::sleep(interval).await;
                }
                Err(e) => {
                    tracing::warn!("announcement failed, retrying: {e}");
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// Ask which hosts claim to hold `key`.
    ///
    /// Lines of the response body that do not parse as addresses are
    /// skipped with a warning; an empty body means nobody claims it.
    pub async fn where_is(&self, key: &ContentKey) -> Result<Vec<HostAddress>, ClientError> {
        let interest = self
            .base
            .child(WHERE_COMPONENT)
            .child(key.as_str())
            .with_nonce()?;
        let content = self.query(&interest).await?;

        let body = String::from_utf8_lossy(&content.payload);
        let hosts = body
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match line.parse::<HostAddress>() {
                Ok(host) => Some(host),
                Err(e) => {
                    tracing::warn!("skipping malformed location line: {e}");
                    None
                }
            })
            .collect();
        Ok(hosts)
    }
}
