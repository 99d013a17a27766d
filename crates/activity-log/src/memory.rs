use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shardwatch_topology::NodeId;
use tokio::sync::Mutex;

use crate::{ActivityEvent, ActivityLog, Error, Result};

/// In-memory activity log for local development and tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryActivityLog {
    events: Arc<Mutex<Vec<ActivityEvent>>>,
    next_id: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
}

impl MemoryActivityLog {
    /// Creates a new, empty `MemoryActivityLog`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event with the next serial id.
    pub async fn record(
        &self,
        server: impl Into<NodeId> + Send,
        action: impl Into<String> + Send,
        time: DateTime<Utc>,
    ) -> ActivityEvent {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let event = ActivityEvent::new(id.to_string(), time, server, action);
        self.events.lock().await.push(event.clone());

        event
    }

    /// Append an event as-is.
    pub async fn append(&self, event: ActivityEvent) {
        self.events.lock().await.push(event);
    }

    /// Make every read fail as if the store were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl ActivityLog for MemoryActivityLog {
    async fn latest(&self, limit: usize) -> Result<Vec<ActivityEvent>> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Offline);
        }

        let mut events = self.events.lock().await.clone();
        events.sort_by(|a, b| b.time.cmp(&a.time));
        events.truncate(limit);

        Ok(events)
    }
}
