//! Inventory sources for announcement.
//!
//! The client announces whatever its [`InventoryProvider`] reports at
//! the moment of each announcement, so a provider backed by mutable
//! state (a directory scan, a database) naturally propagates changes on
//! the next re-announce.

use async_trait::async_trait;
use locator_types::ContentKey;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading an inventory source.
#[derive(Error, Debug)]
pub enum InventoryError {
    /// The backing file could not be read.
    #[error("cannot read inventory {path}: {source}")]
    ReadError {
        /// Path of the inventory file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Source of the content identifiers a node claims to hold.
#[async_trait]
pub trait InventoryProvider: Send + Sync {
    /// The current inventory, in announcement order.
    async fn list(&self) -> Result<Vec<ContentKey>, InventoryError>;
}

/// Inventory read from a newline-separated file on every announcement.
///
/// Blank lines are skipped; the file is re-read each time so edits take
/// effect on the next re-announce without restarting the node.
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    /// Create a provider backed by `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl InventoryProvider for FileInventory {
    async fn list(&self) -> Result<Vec<ContentKey>, InventoryError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| InventoryError::ReadError {
                path: self.path.clone(),
                source,
            })?;
        Ok(text.lines().filter_map(ContentKey::new).collect())
    }
}

/// Fixed in-memory inventory.
pub struct StaticInventory {
    keys: Vec<ContentKey>,
}

impl StaticInventory {
    /// Create a provider holding exactly `keys`.
    pub fn new(keys: Vec<ContentKey>) -> Self {
        Self { keys }
    }

    /// A provider that reports holding nothing, deregistering the node.
    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }
}

#[async_trait]
impl InventoryProvider for StaticInventory {
    async fn list(&self) -> Result<Vec<ContentKey>, InventoryError> {
        Ok(self.keys.clone())
    }
}
