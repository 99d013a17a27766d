use shardwatch_node_client::{AttackAck, NodeClient};
use shardwatch_topology::{ClusterTopology, NodeIdentity};
use tracing::{info, warn};

use crate::{Error, Operation, PendingOperations, Result};

/// Wipes the storage of the cluster's designated attack target.
///
/// The target is fixed when the injector is built; there is no way to aim
/// it anywhere else.
#[derive(Clone, Debug)]
pub struct FaultInjector {
    client: NodeClient,
    pending: PendingOperations,
    target: NodeIdentity,
}

impl FaultInjector {
    /// Create an injector aimed at `topology`'s attack target.
    #[must_use]
    pub fn new(topology: &ClusterTopology, client: NodeClient, pending: PendingOperations) -> Self {
        Self {
            client,
            pending,
            target: topology.attack_target().clone(),
        }
    }

    /// The node every attack goes to.
    #[must_use]
    pub const fn target(&self) -> &NodeIdentity {
        &self.target
    }

    /// Whether an attack is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_pending(Operation::Attack)
    }

    /// Send the attack command and return the node's acknowledgment.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OperationPending`] while another attack runs and
    /// [`Error::AttackFailed`] when the target does not acknowledge.
    pub async fn trigger_attack(&self) -> Result<AttackAck> {
        let _guard = self.pending.acquire(Operation::Attack)?;

        warn!("Attacking {}", self.target);

        let ack = self.client.attack(&self.target).await.map_err(|e| {
            warn!("Attack on {} failed: {}", self.target.id, e);
            Error::AttackFailed { cause: e.cause() }
        })?;

        info!("{} acknowledged attack: {}", self.target.id, ack.message);

        Ok(ack)
    }
}
