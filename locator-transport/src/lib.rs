//! # locator-transport
//!
//! The named-data transport consumed by the directory and its clients.
//!
//! Consumers "query by name" and producers answer with signed, named
//! payloads. The capability surface is deliberately small:
//! - [`Transport::register_handler`] - serve interests under a prefix
//! - [`Transport::express_interest`] - send a named request and suspend
//!   until the matching content arrives (possibly never)
//! - [`Transport::poll`] - drive one bounded iteration of transport I/O
//!
//! Two implementations mirror each other:
//! - [`MemoryFabric`] / [`MemoryTransport`] - in-process, for tests and
//!   single-process demos
//! - [`ForwarderTransport`] - TCP client of an external forwarder daemon
//!
//! Content signing internals are out of scope here; transports attach a
//! SHA-256 digest tag over the name and payload so responses carry a
//! verifiable binding without a key infrastructure.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod forwarder;
mod frame;
mod memory;

pub use forwarder::ForwarderTransport;
pub use frame::{read_frame, write_frame, Frame, MAX_FRAME_BYTES};
pub use memory::{MemoryFabric, MemoryTransport};

use async_trait::async_trait;
use locator_types::Name;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

/// Transport errors.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not reach the transport substrate.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The transport shut down while an operation was in flight.
    #[error("transport closed")]
    Closed,

    /// Frame serialization failed.
    #[error("frame serialization failed: {0}")]
    Serialization(#[from] rmp_serde::encode::Error),

    /// Frame deserialization failed.
    #[error("frame deserialization failed: {0}")]
    Deserialization(#[from] rmp_serde::decode::Error),

    /// A frame exceeded the wire size ceiling.
    #[error("oversized frame: {size} bytes (limit: {limit})")]
    OversizedFrame {
        /// Declared frame size.
        size: usize,
        /// Maximum allowed size.
        limit: usize,
    },

    /// I/O error on the forwarder connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for transport operations.
pub type TransportResult<T> = std::result::Result<T, TransportError>;

/// A handler's answer to an interest, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePayload {
    /// The response body.
    pub payload: Vec<u8>,
    /// Freshness hint in seconds; consumers should re-query after it.
    pub freshness_secs: Option<u32>,
}

impl ResponsePayload {
    /// Create a response with a freshness hint.
    pub fn with_freshness(payload: Vec<u8>, freshness_secs: u32) -> Self {
        Self {
            payload,
            freshness_secs: Some(freshness_secs),
        }
    }
}

/// A signed, named response message as delivered to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedContent {
    /// The full name of the interest this content answers.
    pub name: Name,
    /// The response body.
    pub payload: Vec<u8>,
    /// Freshness hint in seconds.
    pub freshness_secs: Option<u32>,
    /// Digest tag binding name and payload.
    pub signature: Vec<u8>,
}

/// Sign a response payload for the given interest name.
pub fn sign_content(name: &Name, response: ResponsePayload) -> SignedContent {
    let mut hasher = Sha256::new();
    hasher.update(name.to_string().as_bytes());
    hasher.update(&response.payload);
    SignedContent {
        name: name.clone(),
        payload: response.payload,
        freshness_secs: response.freshness_secs,
        signature: hasher.finalize().to_vec(),
    }
}

/// Serves interests arriving under a registered name prefix.
///
/// Returning `None` means "don't answer what you don't own": the interest
/// is silently ignored and no response is sent.
#[async_trait]
pub trait InterestHandler: Send + Sync {
    /// Produce a response for `interest`, or `None` to ignore it.
    async fn handle(&self, interest: &Name) -> Option<ResponsePayload>;
}

/// The named-data request/response substrate.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `handler` for every incoming interest under `prefix`.
    async fn register_handler(
        &self,
        prefix: Name,
        handler: Arc<dyn InterestHandler>,
    ) -> TransportResult<()>;

    /// Send a named request and suspend until the matching signed
    /// content arrives.
    ///
    /// There is no built-in timeout: an unanswered interest suspends
    /// forever, so callers bound the wait themselves.
    async fn express_interest(&self, name: &Name) -> TransportResult<SignedContent>;

    /// Drive at most one iteration of transport I/O, waiting at most
    /// `max_wait` for something to become ready.
    ///
    /// Ready handlers are invoked and completed interests resolved from
    /// inside this call.
    async fn poll(&self, max_wait: Duration) -> TransportResult<()>;
}
