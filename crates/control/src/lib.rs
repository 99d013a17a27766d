//! On-demand operations against the cluster: content transfer and fault
//! injection.
//!
//! These run outside the polling loop. Each kind of operation has a single
//! in-flight slot so a caller cannot start a second upload (or download, or
//! attack) while one is still pending.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod fault;
mod pending;
mod transfer;

pub use error::{Error, Result};
pub use fault::FaultInjector;
pub use pending::{Operation, PendingGuard, PendingOperations};
pub use transfer::TransferCoordinator;
