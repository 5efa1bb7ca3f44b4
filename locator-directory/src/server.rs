//! Directory context and run loop.
//!
//! All state lives in an explicitly owned [`Directory`] handed to the
//! handlers and the ingest task; there are no process-wide globals. The
//! run loop drives the named-data transport with a bounded poll while
//! ingest accepts uploads on its own task.

use crate::config::Config;
use crate::error::Result;
use crate::handlers::{SelfLocationHandler, WhereHandler};
use crate::ingest::IngestService;
use locator_core::RelationStore;
use locator_transport::Transport;
use locator_types::{HostAddress, Name, SERVER_COMPONENT, WHERE_COMPONENT};
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Operational counters for the directory.
///
/// Monotonically increasing, reset only on restart.
#[derive(Debug, Default)]
pub struct DirectoryMetrics {
    /// Self-location queries answered.
    pub self_queries: AtomicU64,
    /// Content-location queries answered.
    pub where_queries: AtomicU64,
    /// Inventory registrations applied.
    pub registrations: AtomicU64,
}

/// The directory process context.
///
/// Owns the directory's immutable identity and the shared relation
/// store; lives from process start to shutdown.
pub struct Directory {
    identity: HostAddress,
    freshness_secs: u32,
    poll_interval: Duration,
    read_timeout: Duration,
    store: Arc<RwLock<RelationStore>>,
    metrics: Arc<DirectoryMetrics>,
}

impl Directory {
    /// Create a directory with the given identity and config.
    pub fn new(identity: HostAddress, config: &Config) -> Self {
        Self {
            identity,
            freshness_secs: config.directory.freshness_secs,
            poll_interval: Duration::from_millis(config.directory.poll_interval_ms),
            read_timeout: Duration::from_secs(config.ingest.read_timeout_secs),
            store: Arc::new(RwLock::new(RelationStore::new())),
            metrics: Arc::new(DirectoryMetrics::default()),
        }
    }

    /// This directory's own reachable endpoint.
    pub fn identity(&self) -> HostAddress {
        self.identity
    }

    /// Shared handle to the relation store.
    pub fn store(&self) -> Arc<RwLock<RelationStore>> {
        Arc::clone(&self.store)
    }

    /// Operational counters.
    pub fn metrics(&self) -> Arc<DirectoryMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Bind the registration listener on `addr`.
    pub async fn bind_ingest(&self, addr: SocketAddr) -> Result<IngestService> {
        IngestService::bind(addr, self.store(), self.read_timeout, self.metrics()).await
    }

    /// Serve registrations on an already-bound listener.
    pub fn ingest_from_listener(&self, listener: tokio::net::TcpListener) -> IngestService {
        IngestService::from_listener(listener, self.store(), self.read_timeout, self.metrics())
    }

    /// Register both query handlers, start ingest, and poll forever.
    ///
    /// Returns only on transport failure.
    pub async fn run(
        &self,
        transport: Arc<dyn Transport>,
        base: Name,
        ingest: IngestService,
    ) -> Result<()> {
        transport
            .register_handler(
                base.child(SERVER_COMPONENT),
                Arc::new(SelfLocationHandler::new(
                    base.child(SERVER_COMPONENT),
                    self.identity,
                    self.freshness_secs,
                    self.metrics(),
                )),
            )
            .await?;

        transport
            .register_handler(
                base.child(WHERE_COMPONENT),
                Arc::new(WhereHandler::new(
                    base.child(WHERE_COMPONENT),
                    self.store(),
                    self.freshness_secs,
                    self.metrics(),
                )),
            )
            .await?;

        tracing::info!(
            identity = %self.identity,
            prefix = %base,
            "directory serving"
        );

        tokio::spawn(ingest.run());

        loop {
            transport.poll(self.poll_interval).await?;
        }
    }
}
