//! Hierarchical names for the named-data transport.

use serde::{Deserialize, Serialize};
use std::fmt;

/// URI scheme accepted (and stripped) when parsing names.
const URI_SCHEME: &str = "ndn:";

/// Error type for name parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    /// The URI contained no components at all.
    #[error("empty name URI: {uri:?}")]
    Empty {
        /// The offending URI.
        uri: String,
    },
    /// A component was empty (`//` in the URI).
    #[error("empty component in name URI: {uri:?}")]
    EmptyComponent {
        /// The offending URI.
        uri: String,
    },
    /// The OS random source failed while generating a disambiguator.
    #[error("nonce generation failed: {reason}")]
    Nonce {
        /// Underlying failure description.
        reason: String,
    },
}

/// A hierarchical name: an ordered list of UTF-8 components.
///
/// Names address both interests ("requests by name") and the content
/// that answers them. Parsed from `/a/b/c` or `ndn:/a/b/c` URIs and
/// displayed back in the `ndn:` form.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Name {
    components: Vec<String>,
}

impl Name {
    /// Parse a name from its URI form.
    ///
    /// Accepts `ndn:/a/b/c` and `/a/b/c`. A trailing slash is tolerated;
    /// empty interior components are rejected.
    pub fn from_uri(uri: &str) -> Result<Self, NameError> {
        let path = uri.strip_prefix(URI_SCHEME).unwrap_or(uri);
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);

        if path.is_empty() {
            return Err(NameError::Empty {
                uri: uri.to_string(),
            });
        }

        let components: Vec<String> = path.split('/').map(str::to_string).collect();
        if components.iter().any(String::is_empty) {
            return Err(NameError::EmptyComponent {
                uri: uri.to_string(),
            });
        }

        Ok(Self { components })
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when the name has no components (never produced by `from_uri`).
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Access a component by index.
    pub fn component(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    /// The next-to-last component, if the name has at least two.
    pub fn next_to_last(&self) -> Option<&str> {
        let len = self.components.len();
        if len < 2 {
            return None;
        }
        self.component(len - 2)
    }

    /// Return a new name with `component` appended.
    pub fn child(&self, component: &str) -> Self {
        let mut components = self.components.clone();
        components.push(component.to_string());
        Self { components }
    }

    /// Return a new name with a random disambiguator component appended.
    ///
    /// The disambiguator keeps otherwise-identical interests distinct on
    /// the transport; it is never part of the content key.
    ///
    /// # Errors
    ///
    /// Fails only when the OS random source is unavailable.
    pub fn with_nonce(&self) -> Result<Self, NameError> {
        let mut bytes = [0u8; 8];
        getrandom::getrandom(&mut bytes).map_err(|e| NameError::Nonce {
            reason: e.to_string(),
        })?;
        Ok(self.child(&hex::encode(bytes)))
    }

    /// True when `prefix` is a (non-strict) prefix of this name.
    pub fn starts_with(&self, prefix: &Name) -> bool {
        if prefix.components.len() > self.components.len() {
            return false;
        }
        self.components
            .iter()
            .zip(&prefix.components)
            .all(|(a, b)| a == b)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URI_SCHEME)?;
        for component in &self.components {
            write!(f, "/{}", component)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl std::str::FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}
