//! Transfers and fault injection against mock storage nodes

use std::io::Write;
use std::time::Duration;

use bytes::Bytes;
use shardwatch_control::{
    Error, FaultInjector, Operation, PendingOperations, TransferCoordinator,
};
use shardwatch_node_client::NodeClient;
use shardwatch_node_mock::{MockNode, start_cluster};
use shardwatch_topology::{ClusterTopology, NodeId, Timeouts};

const IDS: [&str; 5] = ["S1", "S2", "S3", "S4", "S5"];

struct Harness {
    injector: FaultInjector,
    nodes: Vec<MockNode>,
    pending: PendingOperations,
    transfers: TransferCoordinator,
}

async fn harness() -> Harness {
    let nodes = start_cluster(IDS, "S3").await.unwrap();
    let topology =
        ClusterTopology::new(nodes.iter().map(MockNode::identity).collect(), "S3").unwrap();
    let client = NodeClient::new(Timeouts::default()).unwrap();
    let pending = PendingOperations::new();

    Harness {
        injector: FaultInjector::new(&topology, client.clone(), pending.clone()),
        transfers: TransferCoordinator::new(topology, client, pending.clone()),
        nodes,
        pending,
    }
}

#[tokio::test]
async fn test_upload_then_download_round_trips() {
    let _ = tracing_subscriber::fmt::try_init();
    let h = harness().await;
    let node = NodeId::from("S2");
    let content = Bytes::from_static(b"the quick brown fox jumps over the lazy dog");

    let receipt = h
        .transfers
        .upload(&node, "fox.txt", content.clone())
        .await
        .unwrap();

    assert_eq!(receipt.filename, "fox.txt");
    assert_eq!(receipt.size, content.len() as u64);
    assert!(!receipt.master_hash.is_empty());
    assert_eq!(h.nodes[1].stored_hashes(), vec![receipt.master_hash.clone()]);

    let downloaded = h
        .transfers
        .download(&node, &receipt.master_hash)
        .await
        .unwrap();

    assert_eq!(downloaded, content);
    assert_eq!(downloaded.len() as u64, receipt.size);
    assert!(!h.pending.is_pending(Operation::Upload));
    assert!(!h.pending.is_pending(Operation::Download));
}

#[tokio::test]
async fn test_upload_path_uses_file_name() {
    let h = harness().await;
    let mut file = tempfile::Builder::new()
        .prefix("report")
        .suffix(".bin")
        .tempfile()
        .unwrap();
    file.write_all(&[7u8; 1000]).unwrap();
    let expected = file
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();

    let receipt = h
        .transfers
        .upload_path(&NodeId::from("S1"), file.path())
        .await
        .unwrap();

    assert_eq!(receipt.filename, expected);
    assert_eq!(receipt.size, 1000);
}

#[tokio::test]
async fn test_upload_missing_file() {
    let h = harness().await;
    let dir = tempfile::tempdir().unwrap();

    let result = h
        .transfers
        .upload_path(&NodeId::from("S1"), dir.path().join("absent.txt"))
        .await;

    assert!(matches!(result, Err(Error::ReadFile { .. })));
}

#[tokio::test]
async fn test_upload_failure_carries_node_message() {
    let h = harness().await;
    h.nodes[0].set_failing(true);

    let result = h
        .transfers
        .upload(&NodeId::from("S1"), "a.txt", Bytes::from_static(b"abc"))
        .await;

    match result {
        Err(Error::UploadFailed { cause }) => assert!(cause.contains("misbehaving")),
        other => panic!("expected UploadFailed, got {other:?}"),
    }
    assert!(!h.pending.is_pending(Operation::Upload));
}

#[tokio::test]
async fn test_unknown_node_is_rejected() {
    let h = harness().await;
    let ghost = NodeId::from("S9");

    let upload = h
        .transfers
        .upload(&ghost, "a.txt", Bytes::from_static(b"abc"))
        .await;
    let download = h.transfers.download(&ghost, "abc").await;

    assert!(matches!(upload, Err(Error::UnknownNode(id)) if id == ghost));
    assert!(matches!(download, Err(Error::UnknownNode(id)) if id == ghost));
}

#[tokio::test]
async fn test_download_failure_is_ambiguous() {
    let h = harness().await;
    let node = NodeId::from("S4");
    let stored = h.nodes[3].insert_file("a.txt", b"abc");

    let unknown = h.transfers.download(&node, "not-a-hash").await.unwrap_err();

    h.nodes[3].set_download_pending(true);
    let syncing = h
        .transfers
        .download(&node, &stored.master_hash)
        .await
        .unwrap_err();

    h.nodes[3].stop();
    let offline = h
        .transfers
        .download(&node, &stored.master_hash)
        .await
        .unwrap_err();

    for error in [unknown, syncing, offline] {
        assert!(matches!(error, Error::DownloadFailed));
        assert_eq!(error.to_string(), "file unavailable, possibly still healing");
    }
}

#[tokio::test]
async fn test_attack_always_hits_target() {
    let h = harness().await;
    h.nodes[2].insert_file("a.txt", b"abc");
    h.nodes[0].insert_file("b.txt", b"def");

    assert_eq!(h.injector.target().id, NodeId::from("S3"));

    let ack = h.injector.trigger_attack().await.unwrap();

    assert_eq!(ack.status, "success");
    assert!(ack.message.contains("S3"));
    assert_eq!(h.nodes[2].attack_requests(), 1);
    assert!(h.nodes[2].stored_hashes().is_empty());
    assert_eq!(h.nodes[0].stored_hashes().len(), 1);
    for (i, node) in h.nodes.iter().enumerate() {
        if i != 2 {
            assert_eq!(node.attack_requests(), 0);
        }
    }
}

#[tokio::test]
async fn test_attack_failure_carries_cause() {
    let h = harness().await;
    h.nodes[2].stop();

    let result = h.injector.trigger_attack().await;

    match result {
        Err(Error::AttackFailed { cause }) => assert!(cause.contains("S3")),
        other => panic!("expected AttackFailed, got {other:?}"),
    }
    assert!(!h.injector.is_pending());
}

#[tokio::test]
async fn test_concurrent_attack_is_rejected_until_first_finishes() {
    let h = harness().await;

    let guard = h.pending.acquire(Operation::Attack).unwrap();
    assert!(h.injector.is_pending());

    let rejected = h.injector.trigger_attack().await;
    assert!(matches!(
        rejected,
        Err(Error::OperationPending(Operation::Attack))
    ));
    assert_eq!(h.nodes[2].attack_requests(), 0);

    drop(guard);
    h.injector.trigger_attack().await.unwrap();
    assert_eq!(h.nodes[2].attack_requests(), 1);
}

#[tokio::test]
async fn test_cancelled_upload_releases_slot() {
    let h = harness().await;
    let node = NodeId::from("S2");
    h.nodes[1].set_upload_delay(Duration::from_secs(5));

    let mut upload = Box::pin(h.transfers.upload(&node, "a.txt", Bytes::from_static(b"abc")));
    let early = tokio::time::timeout(Duration::from_millis(300), &mut upload).await;

    assert!(early.is_err());
    assert!(h.transfers.is_pending(Operation::Upload));
    let second = h
        .transfers
        .upload(&node, "b.txt", Bytes::from_static(b"def"))
        .await;
    assert!(matches!(
        second,
        Err(Error::OperationPending(Operation::Upload))
    ));

    drop(upload);

    assert!(!h.transfers.is_pending(Operation::Upload));
    assert!(!h.pending.is_pending(Operation::Upload));
}
