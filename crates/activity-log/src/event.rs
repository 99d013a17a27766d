use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shardwatch_topology::NodeId;

/// One row of cluster activity written by a storage node.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Store-assigned id, normalized to a string.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// When the node recorded the event.
    #[serde(deserialize_with = "deserialize_time")]
    pub time: DateTime<Utc>,

    /// The node that recorded the event.
    pub server: NodeId,

    /// Free-text description, e.g. `Healed chunk 0003_ab12 from http://...`.
    pub action: String,
}

impl ActivityEvent {
    /// Create an event.
    pub fn new(
        id: impl Into<String>,
        time: DateTime<Utc>,
        server: impl Into<NodeId>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            time,
            server: server.into(),
            action: action.into(),
        }
    }
}

/// Ids are serial integers in some stores and UUIDs in others.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Accepts RFC 3339 timestamps, and naive timestamps taken as UTC.
fn deserialize_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(time.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid event time '{raw}': {e}")))
}
