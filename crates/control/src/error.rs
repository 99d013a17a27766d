use std::path::PathBuf;

use shardwatch_topology::NodeId;
use thiserror::Error;

use crate::Operation;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from transfers and fault injection.
#[derive(Debug, Error)]
pub enum Error {
    /// The attack target did not acknowledge the attack.
    #[error("attack failed: {cause}")]
    AttackFailed {
        /// The node's message, or why it could not be reached.
        cause: String,
    },

    /// The content could not be retrieved. Deliberately ambiguous: the node
    /// may be down, the hash may be unknown, or healing may still be
    /// reassembling it.
    #[error("file unavailable, possibly still healing")]
    DownloadFailed,

    /// Another operation of the same kind is still in flight.
    #[error("{0} already in progress")]
    OperationPending(Operation),

    /// A local file could not be read for upload.
    #[error("could not read {path}: {source}")]
    ReadFile {
        /// The file that was requested.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The requested node is not part of the cluster.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),

    /// The node did not accept the upload.
    #[error("upload failed: {cause}")]
    UploadFailed {
        /// The node's message, or why it could not be reached.
        cause: String,
    },
}
