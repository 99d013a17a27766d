//! Static cluster topology for shardwatch
//!
//! This crate provides:
//! - Node identity types (`NodeId`, `NodeIdentity`)
//! - The fixed cluster description (`ClusterTopology`) with its attack target
//!   policy, request timeouts and polling cadence
//! - Loading and validation of the TOML cluster file
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod cluster;
pub mod error;
pub mod node;

pub use cluster::{ClusterTopology, Timeouts};
pub use error::{Result, TopologyError};
pub use node::{NodeId, NodeIdentity};
