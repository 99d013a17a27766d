use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::{Error, Result};

/// A kind of on-demand operation.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Content upload.
    Upload,

    /// Content download by master hash.
    Download,

    /// Fault injection against the attack target.
    Attack,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => write!(f, "upload"),
            Self::Download => write!(f, "download"),
            Self::Attack => write!(f, "attack"),
        }
    }
}

/// One in-flight slot per [`Operation`]. Clones share the same slots.
#[derive(Clone, Debug, Default)]
pub struct PendingOperations {
    held: Arc<Mutex<HashSet<Operation>>>,
}

impl PendingOperations {
    /// Creates a new set with every slot free.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for `operation`. The slot is released when the guard
    /// drops, including when the owning future is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationPending`] if the slot is already held.
    pub fn acquire(&self, operation: Operation) -> Result<PendingGuard> {
        if !self.held.lock().insert(operation) {
            return Err(Error::OperationPending(operation));
        }
        debug!("{operation} started");

        Ok(PendingGuard {
            held: self.held.clone(),
            operation,
        })
    }

    /// Whether an operation of this kind is in flight.
    #[must_use]
    pub fn is_pending(&self, operation: Operation) -> bool {
        self.held.lock().contains(&operation)
    }
}

/// Holds an operation slot until dropped.
#[derive(Debug)]
pub struct PendingGuard {
    held: Arc<Mutex<HashSet<Operation>>>,
    operation: Operation,
}

impl PendingGuard {
    /// The operation this guard holds.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.held.lock().remove(&self.operation);
        debug!("{} finished", self.operation);
    }
}
