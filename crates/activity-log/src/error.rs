use reqwest::StatusCode;
use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every variant means the log store is unavailable for this read.
#[derive(Debug, Error)]
pub enum Error {
    /// The HTTP client could not be constructed.
    #[error("log store unavailable: could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Rows came back in a shape we cannot read.
    #[error("log store unavailable: malformed rows: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Connection details are missing.
    #[error("log store unavailable: {0} is not configured")]
    NotConfigured(&'static str),

    /// The store answered with a non-success status.
    #[error("log store unavailable: store replied {status}: {message}")]
    Rejected {
        /// HTTP status of the reply.
        status: StatusCode,
        /// Body of the reply.
        message: String,
    },

    /// The store could not be reached.
    #[error("log store unavailable: {0}")]
    Transport(#[source] reqwest::Error),

    /// The store was switched off (in-memory store only).
    #[error("log store unavailable: store is offline")]
    Offline,
}
