//! Cluster liveness and healing monitor.
//!
//! [`ClusterMonitor`] drives the poll cycle: every node's status is probed
//! concurrently, the latest activity window is read alongside, and the
//! merged [`ClusterView`] is published atomically once every probe has
//! resolved. Unreachable nodes and an unavailable log store are expected
//! conditions and only ever show up as data in the view.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
pub mod healing;
mod monitor;
mod snapshot;

pub use error::{Error, Result};
pub use monitor::ClusterMonitor;
pub use snapshot::{ClusterSnapshot, ClusterView};
