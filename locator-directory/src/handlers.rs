//! Interest handlers for the two query kinds.
//!
//! Each inbound request walks Received → Validated → Dispatched →
//! Responded; a name that fails validation returns `None` and is never
//! answered, matching the "don't answer what you don't own" principle.

use crate::server::DirectoryMetrics;
use async_trait::async_trait;
use locator_core::{build_location_body, RelationStore};
use locator_transport::{InterestHandler, ResponsePayload};
use locator_types::{ContentKey, HostAddress, Name};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Answers `<base>/server` interests with this directory's own endpoint.
///
/// The payload is exactly `"<host>:<port>"`; the freshness hint tells
/// consumers when to re-query (and thereby re-announce their inventory).
pub struct SelfLocationHandler {
    prefix: Name,
    identity: HostAddress,
    freshness_secs: u32,
    metrics: Arc<DirectoryMetrics>,
}

impl SelfLocationHandler {
    /// Create a handler serving `prefix` with the given identity.
    pub fn new(
        prefix: Name,
        identity: HostAddress,
        freshness_secs: u32,
        metrics: Arc<DirectoryMetrics>,
    ) -> Self {
        Self {
            prefix,
            identity,
            freshness_secs,
            metrics,
        }
    }
}

#[async_trait]
impl InterestHandler for SelfLocationHandler {
    async fn handle(&self, interest: &Name) -> Option<ResponsePayload> {
        if !interest.starts_with(&self.prefix) {
            return None;
        }

        self.metrics.self_queries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(interest = %interest, identity = %self.identity, "self-location query");

        Some(ResponsePayload::with_freshness(
            self.identity.to_string().into_bytes(),
            self.freshness_secs,
        ))
    }
}

/// Answers `<base>/where/<key>/<nonce>` interests from the relation store.
///
/// The content key is the next-to-last component: the final component is
/// the transport-layer disambiguator and never part of the key.
pub struct WhereHandler {
    prefix: Name,
    store: Arc<RwLock<RelationStore>>,
    freshness_secs: u32,
    metrics: Arc<DirectoryMetrics>,
}

impl WhereHandler {
    /// Create a handler serving `prefix` backed by `store`.
    pub fn new(
        prefix: Name,
        store: Arc<RwLock<RelationStore>>,
        freshness_secs: u32,
        metrics: Arc<DirectoryMetrics>,
    ) -> Self {
        Self {
            prefix,
            store,
            freshness_secs,
            metrics,
        }
    }
}

#[async_trait]
impl InterestHandler for WhereHandler {
    async fn handle(&self, interest: &Name) -> Option<ResponsePayload> {
        if !interest.starts_with(&self.prefix) {
            return None;
        }
        // Need <key> and the disambiguator beyond the prefix.
        if interest.len() < self.prefix.len() + 2 {
            tracing::debug!(interest = %interest, "where query too short, ignoring");
            return None;
        }

        let key = ContentKey::new(interest.next_to_last()?)?;
        let hosts = {
            let store = self.store.read().await;
            store.select(&key)
        };

        self.metrics.where_queries.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, matches = hosts.len(), "content-location query");

        Some(ResponsePayload::with_freshness(
            build_location_body(&hosts),
            self.freshness_secs,
        ))
    }
}
