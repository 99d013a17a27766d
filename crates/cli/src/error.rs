use thiserror::Error;

/// The result type for the CLI.
pub type Result<T> = std::result::Result<T, Error>;

/// CLI-specific error type
#[derive(Debug, Error)]
pub enum Error {
    /// Log store error
    #[error("log store unavailable: {0}")]
    ActivityLog(#[from] shardwatch_activity_log::Error),

    /// Transfer or attack error
    #[error(transparent)]
    Control(#[from] shardwatch_control::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Monitor lifecycle error
    #[error(transparent)]
    Monitor(#[from] shardwatch_monitor::Error),

    /// Node call error
    #[error(transparent)]
    Node(#[from] shardwatch_node_client::Error),

    /// Could not set global default subscriber.
    #[error("could not set global default subscriber: {0}")]
    SetTracing(#[from] tracing::dispatcher::SetGlobalDefaultError),

    /// Cluster configuration error
    #[error("invalid cluster configuration: {0}")]
    Topology(#[from] shardwatch_topology::TopologyError),

    /// The requested node is not configured.
    #[error("unknown node {0}")]
    UnknownNode(String),
}
