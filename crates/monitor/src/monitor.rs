//! The polling loop and the published cluster view

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use shardwatch_activity_log::{ActivityLog, LogStreamReader};
use shardwatch_node_client::NodeClient;
use shardwatch_topology::ClusterTopology;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::healing;
use crate::snapshot::{ClusterSnapshot, ClusterView};
use crate::{Error, Result};

/// How long shutdown waits for an in-flight cycle to notice cancellation.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Polls every node and the activity log on a fixed cadence and publishes
/// one [`ClusterView`] per cycle.
///
/// The current view is only reachable through [`view`](Self::view) and
/// [`subscribe`](Self::subscribe); only the monitor itself publishes.
pub struct ClusterMonitor<L>
where
    L: ActivityLog,
{
    inner: Arc<Inner<L>>,
    shutdown_token: CancellationToken,
    task_tracker: TaskTracker,
}

struct Inner<L>
where
    L: ActivityLog,
{
    client: NodeClient,
    cycles: AtomicU64,
    publisher: watch::Sender<Arc<ClusterView>>,
    reader: LogStreamReader<L>,
    topology: ClusterTopology,
}

impl<L> ClusterMonitor<L>
where
    L: ActivityLog,
{
    /// Create a monitor. Nothing is polled until [`start`](Self::start) or
    /// [`run_cycle`](Self::run_cycle) is called; until then the view shows
    /// every node offline.
    pub fn new(topology: ClusterTopology, client: NodeClient, activity_log: L) -> Self {
        info!(
            "Creating cluster monitor for {} nodes with poll interval {:?}",
            topology.nodes().len(),
            topology.poll_interval()
        );

        let reader = LogStreamReader::new(activity_log, topology.log_window());
        let (publisher, _) = watch::channel(ClusterView::initial(&topology));

        Self {
            inner: Arc::new(Inner {
                client,
                cycles: AtomicU64::new(0),
                publisher,
                reader,
                topology,
            }),
            shutdown_token: CancellationToken::new(),
            task_tracker: TaskTracker::new(),
        }
    }

    /// The cluster being monitored.
    pub fn topology(&self) -> &ClusterTopology {
        &self.inner.topology
    }

    /// The most recently published view.
    pub fn view(&self) -> Arc<ClusterView> {
        self.inner.publisher.borrow().clone()
    }

    /// Receive every view published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ClusterView>> {
        self.inner.publisher.subscribe()
    }

    /// Run one full cycle now and return the view it published.
    pub async fn run_cycle(&self) -> Arc<ClusterView> {
        self.inner.run_cycle().await
    }

    /// Probe every node once without touching the published view.
    pub async fn poll_nodes(&self) -> ClusterSnapshot {
        self.inner.poll_nodes().await
    }

    /// Whether the polling loop is running.
    pub fn is_running(&self) -> bool {
        self.task_tracker.is_closed() && !self.shutdown_token.is_cancelled()
    }

    /// Start the recurring polling loop. The first cycle runs immediately.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyStarted`] if called more than once.
    pub fn start(&self) -> Result<()> {
        if self.task_tracker.is_closed() {
            return Err(Error::AlreadyStarted);
        }

        let inner = self.inner.clone();
        let shutdown_token = self.shutdown_token.clone();
        self.task_tracker.spawn(async move {
            let mut interval = tokio::time::interval(inner.topology.poll_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = shutdown_token.cancelled() => break,
                    _ = interval.tick() => {}
                }

                tokio::select! {
                    () = shutdown_token.cancelled() => {
                        debug!("Abandoning in-flight poll cycle");
                        break;
                    }
                    view = inner.run_cycle() => {
                        debug!(
                            "Cycle {} published: {}/{} online, healing={}",
                            view.cycle,
                            view.snapshot.online_count(),
                            view.snapshot.len(),
                            view.healing
                        );
                    }
                }
            }

            info!("Cluster monitor stopped");
        });
        self.task_tracker.close();

        info!("Cluster monitor started");
        Ok(())
    }

    /// Stop the polling loop and wait for it to exit. No view is published
    /// after this returns.
    pub async fn shutdown(&self) {
        info!("Shutting down cluster monitor");

        self.shutdown_token.cancel();
        self.task_tracker.close();

        if tokio::time::timeout(SHUTDOWN_GRACE, self.task_tracker.wait())
            .await
            .is_err()
        {
            warn!("Cluster monitor did not stop within {:?}", SHUTDOWN_GRACE);
        }
    }
}

impl<L> Inner<L>
where
    L: ActivityLog,
{
    async fn run_cycle(&self) -> Arc<ClusterView> {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;

        // the log read may not outlast the node probes
        let log_budget = self.client.timeouts().status;
        let activity = async {
            tokio::time::timeout(log_budget, self.reader.fetch())
                .await
                .unwrap_or_else(|_| {
                    warn!("Activity log read exceeded {:?}, using empty window", log_budget);
                    Vec::new()
                })
        };
        let (snapshot, activity) = tokio::join!(self.poll_nodes(), activity);

        let now = Utc::now();
        let healing = healing::detect(&activity, now);

        let view = Arc::new(ClusterView {
            cycle,
            refreshed_at: now,
            snapshot,
            activity,
            healing,
        });
        self.publish(view.clone());

        view
    }

    async fn poll_nodes(&self) -> ClusterSnapshot {
        let probes = self
            .topology
            .nodes()
            .iter()
            .map(|node| self.client.status(node));
        let statuses = join_all(probes).await;

        ClusterSnapshot::from_statuses(&self.topology, statuses)
    }

    /// Replace the published view unless a newer cycle already landed.
    fn publish(&self, view: Arc<ClusterView>) {
        self.publisher.send_if_modified(|current| {
            if view.cycle > current.cycle {
                *current = view;
                true
            } else {
                debug!(
                    "Dropping cycle {} superseded by cycle {}",
                    view.cycle, current.cycle
                );
                false
            }
        });
    }
}
