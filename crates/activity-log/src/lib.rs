//! Read access to the shared, append-only cluster activity log.
//!
//! Storage nodes write one row per notable action (uploads, downloads,
//! healed chunks, attacks). This crate only ever reads: [`ActivityLog`]
//! returns the newest rows in the store's own descending time order, and
//! [`LogStreamReader`] wraps a store so that an unavailable store degrades to
//! an empty window instead of failing the caller.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod event;
mod memory;
mod postgrest;

pub use error::{Error, Result};
pub use event::ActivityEvent;
pub use memory::MemoryActivityLog;
pub use postgrest::{DEFAULT_TABLE, PostgrestActivityLog, PostgrestConfig};

use async_trait::async_trait;
use tracing::warn;

/// Default number of events read per window.
pub const DEFAULT_WINDOW: usize = 50;

/// A store of activity events, queryable newest first.
#[async_trait]
pub trait ActivityLog: Clone + Send + Sync + 'static {
    /// The newest `limit` events, ordered by time descending.
    async fn latest(&self, limit: usize) -> Result<Vec<ActivityEvent>>;
}

/// Reads a bounded window of recent activity.
///
/// Trusts the store's ordering: events are neither re-sorted nor
/// deduplicated.
#[derive(Clone, Debug)]
pub struct LogStreamReader<L>
where
    L: ActivityLog,
{
    store: L,
    window: usize,
}

impl<L> LogStreamReader<L>
where
    L: ActivityLog,
{
    /// Create a reader over `store` returning at most `window` events.
    pub const fn new(store: L, window: usize) -> Self {
        Self { store, window }
    }

    /// Maximum number of events per read.
    pub const fn window(&self) -> usize {
        self.window
    }

    /// The underlying store.
    pub const fn store(&self) -> &L {
        &self.store
    }

    /// The latest window, or an empty one if the store is unavailable.
    pub async fn fetch(&self) -> Vec<ActivityEvent> {
        match self.try_fetch().await {
            Ok(events) => events,
            Err(e) => {
                warn!("Activity log read failed, using empty window: {}", e);
                Vec::new()
            }
        }
    }

    /// The latest window, surfacing store failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the store is unconfigured, unreachable, or
    /// returns rows that cannot be read.
    pub async fn try_fetch(&self) -> Result<Vec<ActivityEvent>> {
        let mut events = self.store.latest(self.window).await?;
        // a store that ignores the limit must not widen the window
        events.truncate(self.window);

        Ok(events)
    }
}
