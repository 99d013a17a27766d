use reqwest::StatusCode;
use shardwatch_topology::NodeId;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from calls against a single storage node.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be constructed.
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The node replied with a body that does not match the contract.
    #[error("node {node} sent an invalid response: {reason}")]
    InvalidResponse {
        /// The node that replied.
        node: NodeId,
        /// What was wrong with the body.
        reason: String,
    },

    /// Transport failure or timeout. Expected steady-state information, not
    /// a bug: the node is simply offline from our point of view.
    #[error("node {node} unreachable: {source}")]
    NodeUnreachable {
        /// The node that could not be reached.
        node: NodeId,
        /// The transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The node answered with a non-success status.
    #[error("node {node} rejected the request ({status}): {message}")]
    Rejected {
        /// The node that replied.
        node: NodeId,
        /// HTTP status of the reply.
        status: StatusCode,
        /// The node's own message (`detail`) or the raw body.
        message: String,
    },
}

impl Error {
    /// Whether this error means the node could not be reached at all.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::NodeUnreachable { .. })
    }

    /// Human-readable cause, preferring the node's own message.
    #[must_use]
    pub fn cause(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::NodeUnreachable { node, source } if source.is_timeout() => {
                format!("node {node} timed out")
            }
            Self::NodeUnreachable { node, .. } => format!("node {node} unreachable"),
            other => other.to_string(),
        }
    }
}
