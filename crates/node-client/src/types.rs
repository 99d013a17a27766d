use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shardwatch_topology::NodeId;

/// Map of master hash to the chunk file names a node holds for it.
pub type InventoryListing = BTreeMap<String, Vec<String>>;

/// The JSON object a node returns from `GET /status`.
///
/// Kept opaque: typed accessors read the well-known fields but nothing is
/// required, so a node reporting extra or fewer fields is still online.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusPayload(Map<String, Value>);

impl StatusPayload {
    /// Wrap a raw JSON object.
    #[must_use]
    pub const fn new(raw: Map<String, Value>) -> Self {
        Self(raw)
    }

    /// The raw key-value payload.
    #[must_use]
    pub const fn raw(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Name the node reports for itself.
    #[must_use]
    pub fn server(&self) -> Option<&str> {
        self.0.get("server").and_then(Value::as_str)
    }

    /// Self-reported state, normally `"online"`.
    #[must_use]
    pub fn status(&self) -> Option<&str> {
        self.0.get("status").and_then(Value::as_str)
    }

    /// Number of master hashes the node stores.
    #[must_use]
    pub fn storage_usage(&self) -> Option<u64> {
        self.0.get("storage_usage").and_then(Value::as_u64)
    }

    /// Peer origins the node heals from.
    #[must_use]
    pub fn peers(&self) -> Vec<&str> {
        self.0
            .get("peers")
            .and_then(Value::as_array)
            .map(|peers| peers.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Outcome of probing one node's status.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum NodeProbe {
    /// The node answered with a status payload.
    Online(StatusPayload),

    /// Timeout or transport failure.
    Unreachable,

    /// The node answered, but not with a usable status.
    Error(String),
}

/// Liveness of one node as observed in one poll cycle.
///
/// Always rebuilt from scratch; fields from an earlier probe are never
/// carried over.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NodeStatus {
    /// The probed node.
    pub node_id: NodeId,

    /// What the probe found.
    pub probe: NodeProbe,
}

impl NodeStatus {
    /// Create a status from a probe outcome.
    #[must_use]
    pub const fn new(node_id: NodeId, probe: NodeProbe) -> Self {
        Self { node_id, probe }
    }

    /// A status for a node that has not answered.
    #[must_use]
    pub const fn offline(node_id: NodeId) -> Self {
        Self::new(node_id, NodeProbe::Unreachable)
    }

    /// Whether the node answered with a status payload.
    #[must_use]
    pub const fn online(&self) -> bool {
        matches!(self.probe, NodeProbe::Online(_))
    }

    /// The status payload, only present while online.
    #[must_use]
    pub const fn raw(&self) -> Option<&StatusPayload> {
        match &self.probe {
            NodeProbe::Online(payload) => Some(payload),
            NodeProbe::Unreachable | NodeProbe::Error(_) => None,
        }
    }
}

/// Receipt returned by a node for a successful upload.
///
/// The node is the content-addressing authority; nothing here is checked.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransferResult {
    /// Content fingerprint; the only durable handle for downloading.
    pub master_hash: String,

    /// Name the node stored the file under.
    pub filename: String,

    /// Size of the original content in bytes.
    pub size: u64,

    /// Number of chunks the node split the content into.
    pub chunk_count: u32,

    /// Hash over the chunk hashes, when the node reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integrity_hash: Option<String>,
}

/// Acknowledgement of the attack command.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AttackAck {
    /// Node-reported outcome, normally `"success"`.
    #[serde(default)]
    pub status: String,

    /// Node-reported description.
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
pub(crate) struct DownloadRequest<'a> {
    pub master_hash: &'a str,
}
