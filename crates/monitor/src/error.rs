use thiserror::Error;

/// The result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the monitor lifecycle. Polling itself never fails.
#[derive(Debug, Error)]
pub enum Error {
    /// The polling loop has already been started.
    #[error("the monitor has already started")]
    AlreadyStarted,
}
