//! Simple error types for topology operations

use std::path::PathBuf;

use thiserror::Error;

use crate::NodeId;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Topology-related errors
#[derive(Debug, Error)]
pub enum TopologyError {
    /// The configured attack target is not one of the cluster nodes.
    #[error("attack target {0} is not a configured node")]
    AttackTargetNotConfigured(NodeId),

    /// The same node id appears more than once.
    #[error("duplicate node id {0}")]
    DuplicateNode(NodeId),

    /// The cluster has no nodes.
    #[error("cluster topology has no nodes")]
    Empty,

    /// A node's base address is not a usable HTTP origin.
    #[error("invalid base address for node {node}: {reason}")]
    InvalidAddress {
        /// The offending node.
        node: NodeId,
        /// Why the address was rejected.
        reason: String,
    },

    /// A tunable was out of range.
    #[error("invalid setting {0}: must be greater than zero")]
    InvalidSetting(&'static str),

    /// Failed to read the cluster file.
    #[error("could not read cluster file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the cluster file.
    #[error("could not parse cluster file: {0}")]
    Parse(#[from] toml::de::Error),
}
