//! # locator-client
//!
//! Client library for the locator directory.
//!
//! A node uses [`DirectoryClient`] to:
//! - discover the directory's upload endpoint (`<base>/server`)
//! - announce its content inventory over TCP, re-announcing on the
//!   cadence the directory's freshness hint suggests
//! - ask where a piece of content lives (`<base>/where/<key>`)
//!
//! The inventory itself comes from an [`InventoryProvider`], so the
//! announcement loop is independent of how the node tracks what it
//! holds.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod client;
mod inventory;

pub use client::{ClientError, DirectoryClient};
pub use inventory::{FileInventory, InventoryError, InventoryProvider, StaticInventory};
