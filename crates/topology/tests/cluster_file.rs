//! Tests for loading cluster files

use std::io::Write;
use std::time::Duration;

use shardwatch_topology::{ClusterTopology, NodeId, TopologyError};

const THREE_NODES: &str = r#"
attack_target = "B"
poll_interval_ms = 1500
log_window = 20

[timeouts]
status_ms = 750
download_ms = 90000

[[nodes]]
id = "A"
base_address = "http://10.0.0.1:8000"

[[nodes]]
id = "B"
base_address = "http://10.0.0.2:8000"

[[nodes]]
id = "C"
base_address = "https://c.example.com/storage/"
"#;

#[test]
fn test_load_cluster_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(THREE_NODES.as_bytes()).unwrap();

    let topology = ClusterTopology::from_file(file.path()).unwrap();

    assert_eq!(topology.nodes().len(), 3);
    assert_eq!(topology.attack_target().id, NodeId::from("B"));
    assert_eq!(topology.poll_interval(), Duration::from_millis(1500));
    assert_eq!(topology.log_window(), 20);
    assert_eq!(topology.timeouts().status, Duration::from_millis(750));
    assert_eq!(topology.timeouts().download, Duration::from_secs(90));
    // untouched timeouts keep their defaults
    assert_eq!(topology.timeouts().upload, Duration::from_secs(60));
    assert_eq!(
        topology.node(&NodeId::from("C")).unwrap().endpoint("status"),
        "https://c.example.com/storage/status"
    );
}

#[test]
fn test_missing_file() {
    let result = ClusterTopology::from_file("/nonexistent/shardwatch/cluster.toml");

    assert!(matches!(result, Err(TopologyError::Io { .. })));
}

#[test]
fn test_attack_target_must_be_configured() {
    let contents = r#"
attack_target = "S9"

[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8001"
"#;

    let result = ClusterTopology::from_toml_str(contents);

    assert!(matches!(
        result,
        Err(TopologyError::AttackTargetNotConfigured(id)) if id == NodeId::from("S9")
    ));
}

#[test]
fn test_attack_target_defaults_to_s3() {
    let contents = r#"
[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8001"

[[nodes]]
id = "S3"
base_address = "http://127.0.0.1:8003"
"#;

    let topology = ClusterTopology::from_toml_str(contents).unwrap();

    assert_eq!(topology.attack_target().id, NodeId::from("S3"));
}

#[test]
fn test_duplicate_node_ids_are_rejected() {
    let contents = r#"
attack_target = "S1"

[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8001"

[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8002"
"#;

    let result = ClusterTopology::from_toml_str(contents);

    assert!(matches!(result, Err(TopologyError::DuplicateNode(_))));
}

#[test]
fn test_empty_cluster_is_rejected() {
    let result = ClusterTopology::from_toml_str("nodes = []");

    assert!(matches!(result, Err(TopologyError::Empty)));
}

#[test]
fn test_non_http_address_is_rejected() {
    let contents = r#"
attack_target = "S1"

[[nodes]]
id = "S1"
base_address = "ftp://127.0.0.1:8001"
"#;

    let result = ClusterTopology::from_toml_str(contents);

    assert!(matches!(result, Err(TopologyError::InvalidAddress { .. })));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let contents = r#"
attack_target = "S1"

[timeouts]
status_ms = 0

[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8001"
"#;

    let result = ClusterTopology::from_toml_str(contents);

    assert!(matches!(
        result,
        Err(TopologyError::InvalidSetting("timeouts.status_ms"))
    ));
}

#[test]
fn test_unknown_keys_are_rejected() {
    let contents = r#"
attack_targets = ["S1"]

[[nodes]]
id = "S1"
base_address = "http://127.0.0.1:8001"
"#;

    let result = ClusterTopology::from_toml_str(contents);

    assert!(matches!(result, Err(TopologyError::Parse(_))));
}
