//! # locator-directory
//!
//! The directory daemon for the locator protocol.
//!
//! Nodes report which content identifiers they hold over a plain TCP
//! upload; consumers ask "who holds content X" and "where is this
//! directory reachable" over the named-data transport. The daemon:
//! - keeps the bi-indexed relation store of content → host claims
//! - ingests inventory uploads, replacing a peer's prior registrations
//! - answers self-location and content-location interests with signed,
//!   freshness-tagged responses
//!
//! ## Architecture
//!
//! ```text
//!              interests                 inventory uploads
//!  consumers ─────────────► transport ◄─────── TCP ───────  holders
//!                              │                 │
//!                        ┌─────┴─────────────────┴─────┐
//!                        │         locatord            │
//!                        │  ┌───────────────────────┐  │
//!                        │  │ RelationStore (RwLock) │  │
//!                        │  └───────────────────────┘  │
//!                        └──────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod ingest;
pub mod server;

pub use config::Config;
pub use error::{DirectoryError, Result};
pub use server::{Directory, DirectoryMetrics};
