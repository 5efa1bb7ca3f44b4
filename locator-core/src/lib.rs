//! # locator-core
//!
//! Pure logic for the locator directory (no I/O, instant tests).
//!
//! This crate implements the directory's data structures and byte-level
//! policies without any network I/O:
//! - [`RelationStore`] - the bi-indexed content ↔ host mapping
//! - [`build_location_body`] - the size-bounded where-response body
//! - [`parse_inventory`] / [`clamp_ingest_payload`] - ingest payload rules
//!
//! All modules take input and produce output without side effects, so the
//! request-critical invariants (replace-on-reregister, truncation cutoffs)
//! are tested here without sockets or async.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod body;
pub mod inventory;
pub mod store;

pub use body::{build_location_body, MAX_RESPONSE_BODY};
pub use inventory::{clamp_ingest_payload, parse_inventory, INGEST_ACK, MAX_INGEST_BYTES};
pub use store::RelationStore;
