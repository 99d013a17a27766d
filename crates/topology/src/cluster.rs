//! The fixed cluster description and its loader

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::{NodeId, NodeIdentity, Result, TopologyError};

/// Default cadence of the status polling loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default number of activity events read per cycle.
const DEFAULT_LOG_WINDOW: usize = 50;

/// Node that receives the attack command unless configured otherwise.
const DEFAULT_ATTACK_TARGET: &str = "S3";

/// The five public storage nodes used when no cluster file is given.
const DEFAULT_NODES: [(&str, &str); 5] = [
    ("S1", "https://storage-s1.onrender.com"),
    ("S2", "https://storage-s2.onrender.com"),
    ("S3", "https://storage-s3.onrender.com"),
    ("S4", "https://storage-s4.onrender.com"),
    ("S5", "https://storage-s5.onrender.com"),
];

/// Per-call request timeouts towards storage nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timeouts {
    /// `GET /status`. Kept short so liveness never stalls a poll cycle.
    pub status: Duration,

    /// `GET /hashes`.
    pub hashes: Duration,

    /// `POST /upload`.
    pub upload: Duration,

    /// `POST /download`. Nodes may wait for missing chunks before replying.
    pub download: Duration,

    /// `POST /attack`.
    pub attack: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            status: Duration::from_secs(2),
            hashes: Duration::from_secs(5),
            upload: Duration::from_secs(60),
            download: Duration::from_secs(60),
            attack: Duration::from_secs(10),
        }
    }
}

/// Immutable description of the supervised cluster.
///
/// Always valid once constructed: at least one node, unique ids, and an
/// attack target that is one of the nodes.
#[derive(Clone, Debug)]
pub struct ClusterTopology {
    nodes: Vec<NodeIdentity>,
    attack_target: NodeId,
    poll_interval: Duration,
    log_window: usize,
    timeouts: Timeouts,
}

impl ClusterTopology {
    /// Create a topology with default cadence and timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if `nodes` is empty, contains duplicate ids or
    /// non-HTTP addresses, or if `attack_target` is not among them.
    pub fn new(nodes: Vec<NodeIdentity>, attack_target: impl Into<NodeId>) -> Result<Self> {
        let topology = Self {
            nodes,
            attack_target: attack_target.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_window: DEFAULT_LOG_WINDOW,
            timeouts: Timeouts::default(),
        };
        topology.validate()?;

        Ok(topology)
    }

    /// The built-in five node cluster (`S1`..`S5`) with `S3` as attack target.
    #[must_use]
    pub fn default_cluster() -> Self {
        let nodes = DEFAULT_NODES
            .iter()
            .filter_map(|(id, origin)| {
                Url::parse(origin)
                    .ok()
                    .map(|base| NodeIdentity::new(*id, base))
            })
            .collect();

        Self {
            nodes,
            attack_target: NodeId::from(DEFAULT_ATTACK_TARGET),
            poll_interval: DEFAULT_POLL_INTERVAL,
            log_window: DEFAULT_LOG_WINDOW,
            timeouts: Timeouts::default(),
        }
    }

    /// Load a topology from a TOML cluster file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading cluster file from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse a topology from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or validated.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: ClusterFile = toml::from_str(contents)?;
        let defaults = Timeouts::default();
        let timeouts = file.timeouts.unwrap_or_default();

        let topology = Self {
            nodes: file
                .nodes
                .into_iter()
                .map(|node| NodeIdentity::new(node.id, node.base_address))
                .collect(),
            attack_target: file
                .attack_target
                .unwrap_or_else(|| NodeId::from(DEFAULT_ATTACK_TARGET)),
            poll_interval: file
                .poll_interval_ms
                .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis),
            log_window: file.log_window.unwrap_or(DEFAULT_LOG_WINDOW),
            timeouts: Timeouts {
                status: timeouts.status_ms.map_or(defaults.status, Duration::from_millis),
                hashes: timeouts.hashes_ms.map_or(defaults.hashes, Duration::from_millis),
                upload: timeouts.upload_ms.map_or(defaults.upload, Duration::from_millis),
                download: timeouts
                    .download_ms
                    .map_or(defaults.download, Duration::from_millis),
                attack: timeouts.attack_ms.map_or(defaults.attack, Duration::from_millis),
            },
        };
        topology.validate()?;

        debug!(
            "Parsed cluster of {} nodes, attack target {}",
            topology.nodes.len(),
            topology.attack_target
        );

        Ok(topology)
    }

    /// Replace the polling cadence.
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is zero.
    pub fn with_poll_interval(mut self, interval: Duration) -> Result<Self> {
        self.poll_interval = interval;
        self.validate()?;
        Ok(self)
    }

    /// Replace the activity window size.
    ///
    /// # Errors
    ///
    /// Returns an error if `window` is zero.
    pub fn with_log_window(mut self, window: usize) -> Result<Self> {
        self.log_window = window;
        self.validate()?;
        Ok(self)
    }

    /// Replace the request timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if any timeout is zero.
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Result<Self> {
        self.timeouts = timeouts;
        self.validate()?;
        Ok(self)
    }

    /// All configured nodes, in configuration order.
    #[must_use]
    pub fn nodes(&self) -> &[NodeIdentity] {
        &self.nodes
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NodeIdentity> {
        self.nodes.iter().find(|node| &node.id == id)
    }

    /// The one node fault injection is allowed to hit.
    #[must_use]
    pub fn attack_target(&self) -> &NodeIdentity {
        // validate() guarantees the target is present
        self.node(&self.attack_target).unwrap_or(&self.nodes[0])
    }

    /// Cadence of the status polling loop.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Number of activity events read per cycle.
    #[must_use]
    pub const fn log_window(&self) -> usize {
        self.log_window
    }

    /// Request timeouts towards nodes.
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    fn validate(&self) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(TopologyError::Empty);
        }

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(TopologyError::DuplicateNode(node.id.clone()));
            }

            if !matches!(node.base_address.scheme(), "http" | "https") {
                return Err(TopologyError::InvalidAddress {
                    node: node.id.clone(),
                    reason: format!("unsupported scheme '{}'", node.base_address.scheme()),
                });
            }

            if node.base_address.host_str().is_none() {
                return Err(TopologyError::InvalidAddress {
                    node: node.id.clone(),
                    reason: "missing host".to_string(),
                });
            }
        }

        if !seen.contains(&self.attack_target) {
            return Err(TopologyError::AttackTargetNotConfigured(
                self.attack_target.clone(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(TopologyError::InvalidSetting("poll_interval_ms"));
        }

        if self.log_window == 0 {
            return Err(TopologyError::InvalidSetting("log_window"));
        }

        let timeouts = [
            ("timeouts.status_ms", self.timeouts.status),
            ("timeouts.hashes_ms", self.timeouts.hashes),
            ("timeouts.upload_ms", self.timeouts.upload),
            ("timeouts.download_ms", self.timeouts.download),
            ("timeouts.attack_ms", self.timeouts.attack),
        ];
        if let Some((name, _)) = timeouts.iter().find(|(_, timeout)| timeout.is_zero()) {
            return Err(TopologyError::InvalidSetting(*name));
        }

        Ok(())
    }
}

impl Default for ClusterTopology {
    fn default() -> Self {
        Self::default_cluster()
    }
}

/// Node definition in the cluster file
#[derive(Debug, Deserialize)]
struct ConfigNode {
    id: NodeId,
    base_address: Url,
}

/// Timeout overrides in the cluster file
#[derive(Debug, Default, Deserialize)]
struct ConfigTimeouts {
    status_ms: Option<u64>,
    hashes_ms: Option<u64>,
    upload_ms: Option<u64>,
    download_ms: Option<u64>,
    attack_ms: Option<u64>,
}

/// Cluster file
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClusterFile {
    attack_target: Option<NodeId>,
    poll_interval_ms: Option<u64>,
    log_window: Option<usize>,
    timeouts: Option<ConfigTimeouts>,
    nodes: Vec<ConfigNode>,
}
