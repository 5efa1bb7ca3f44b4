//! # locator-types
//!
//! Shared vocabulary types for the locator directory protocol:
//! - [`Name`] - Hierarchical names used to address interests and content
//! - [`ContentKey`] - Identifier for a piece of tracked content
//! - [`HostAddress`] - Reachable endpoint of a node claiming to hold content

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ids;
mod name;

pub use ids::{AddressParseError, ContentKey, HostAddress};
pub use name::{Name, NameError};

/// Name component under which a directory answers self-location queries.
pub const SERVER_COMPONENT: &str = "server";

/// Name component under which a directory answers content-location queries.
pub const WHERE_COMPONENT: &str = "where";
