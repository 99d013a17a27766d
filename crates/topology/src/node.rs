//! Node identity types

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Stable, unique identifier of a storage node (for example `S3`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A storage node as configured at process start.
///
/// Identities never change for the lifetime of the process; everything the
/// monitor learns about a node at runtime lives elsewhere.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Unique node id.
    pub id: NodeId,

    /// Origin the node's HTTP API is served from.
    pub base_address: Url,
}

impl NodeIdentity {
    /// Create a new node identity.
    pub fn new(id: impl Into<NodeId>, base_address: Url) -> Self {
        Self {
            id: id.into(),
            base_address,
        }
    }

    /// Full URL of one of the node's endpoints, e.g. `endpoint("status")`.
    ///
    /// Any path on the base address is kept; a trailing slash is not required.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_address.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.base_address)
    }
}
