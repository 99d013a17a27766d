use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use shardwatch_activity_log::ActivityEvent;
use shardwatch_node_client::NodeStatus;
use shardwatch_topology::{ClusterTopology, NodeId};

/// Liveness of every configured node from one poll cycle.
///
/// Holds exactly one entry per configured node, in configuration order.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ClusterSnapshot(IndexMap<NodeId, NodeStatus>);

impl ClusterSnapshot {
    /// Every configured node marked offline.
    #[must_use]
    pub fn offline(topology: &ClusterTopology) -> Self {
        Self::from_statuses(topology, Vec::new())
    }

    /// Assemble a snapshot from probe results.
    ///
    /// Nodes without a result are marked offline and results for nodes not
    /// in `topology` are dropped, so the entry-per-node invariant holds no
    /// matter what is passed in.
    #[must_use]
    pub fn from_statuses(topology: &ClusterTopology, statuses: Vec<NodeStatus>) -> Self {
        let mut by_id: IndexMap<NodeId, NodeStatus> = statuses
            .into_iter()
            .map(|status| (status.node_id.clone(), status))
            .collect();

        let entries = topology
            .nodes()
            .iter()
            .map(|node| {
                let status = by_id
                    .swap_remove(&node.id)
                    .unwrap_or_else(|| NodeStatus::offline(node.id.clone()));
                (node.id.clone(), status)
            })
            .collect();

        Self(entries)
    }

    /// Status of one node.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&NodeStatus> {
        self.0.get(id)
    }

    /// Statuses in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeStatus> {
        self.0.values()
    }

    /// Number of entries; always the configured node count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of nodes that answered their status probe.
    #[must_use]
    pub fn online_count(&self) -> usize {
        self.iter().filter(|status| status.online()).count()
    }
}

/// Everything observers see after one cycle: liveness plus recent activity.
///
/// Activity and liveness are refreshed in the same cycle but not read at the
/// same instant; they are eventually consistent with each other.
#[derive(Clone, Debug, Serialize)]
pub struct ClusterView {
    /// Cycle that produced this view; `0` before the first cycle completes.
    pub cycle: u64,

    /// When the cycle finished.
    pub refreshed_at: DateTime<Utc>,

    /// Node liveness.
    pub snapshot: ClusterSnapshot,

    /// Latest activity window, newest first.
    pub activity: Vec<ActivityEvent>,

    /// Whether a repair was logged in the last few seconds.
    pub healing: bool,
}

impl ClusterView {
    pub(crate) fn initial(topology: &ClusterTopology) -> Arc<Self> {
        Arc::new(Self {
            cycle: 0,
            refreshed_at: Utc::now(),
            snapshot: ClusterSnapshot::offline(topology),
            activity: Vec::new(),
            healing: false,
        })
    }
}
