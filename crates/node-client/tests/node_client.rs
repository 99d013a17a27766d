//! Integration tests for the node client against mock storage nodes

use std::time::{Duration, Instant};

use bytes::Bytes;
use reqwest::StatusCode;
use shardwatch_node_client::{Error, NodeClient, NodeProbe};
use shardwatch_node_mock::MockNode;
use shardwatch_topology::{NodeIdentity, Timeouts};
use url::Url;

fn client() -> NodeClient {
    NodeClient::new(Timeouts {
        status: Duration::from_millis(300),
        ..Timeouts::default()
    })
    .unwrap()
}

/// An address nothing listens on.
async fn dead_node() -> NodeIdentity {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    NodeIdentity::new("dead", Url::parse(&format!("http://{addr}")).unwrap())
}

#[tokio::test]
async fn test_status_online() {
    let _ = tracing_subscriber::fmt::try_init();

    let node = MockNode::start("S1").await.unwrap();
    node.set_peers(vec!["http://s2".to_string()]);

    let status = client().status(&node.identity()).await;

    assert!(status.online());
    let payload = status.raw().unwrap();
    assert_eq!(payload.server(), Some("S1"));
    assert_eq!(payload.status(), Some("online"));
    assert_eq!(payload.storage_usage(), Some(0));
    assert_eq!(payload.peers(), vec!["http://s2"]);
}

#[tokio::test]
async fn test_status_timeout_is_unreachable() {
    let node = MockNode::start("S3").await.unwrap();
    node.set_status_delay(Duration::from_secs(5));

    let started = Instant::now();
    let status = client().status(&node.identity()).await;

    assert_eq!(status.probe, NodeProbe::Unreachable);
    assert!(!status.online());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_status_connection_refused_is_unreachable() {
    let node = dead_node().await;

    let status = client().status(&node).await;

    assert_eq!(status.probe, NodeProbe::Unreachable);

    let err = client().fetch_status(&node).await.unwrap_err();
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn test_status_server_error_is_error_probe() {
    let node = MockNode::start("S2").await.unwrap();
    node.set_failing(true);

    let status = client().status(&node.identity()).await;

    match &status.probe {
        NodeProbe::Error(cause) => assert!(cause.contains("misbehaving")),
        other => panic!("expected error probe, got {other:?}"),
    }
    assert!(!status.online());
}

#[tokio::test]
async fn test_upload_download_round_trip() {
    let node = MockNode::start_with_chunk_size("S1", 4).await.unwrap();
    let client = client();
    let content = Bytes::from_static(b"hello distributed world");

    let receipt = client
        .upload(&node.identity(), "hello.txt", content.clone())
        .await
        .unwrap();

    assert_eq!(receipt.filename, "hello.txt");
    assert_eq!(receipt.size, content.len() as u64);
    assert_eq!(receipt.chunk_count, 6);
    assert_eq!(receipt.master_hash.len(), 64);
    assert!(receipt.integrity_hash.is_some());

    let downloaded = client
        .download(&node.identity(), &receipt.master_hash)
        .await
        .unwrap();

    assert_eq!(downloaded.len() as u64, receipt.size);
    assert_eq!(downloaded, content);
}

#[tokio::test]
async fn test_download_unknown_hash_is_rejected_with_node_message() {
    let node = MockNode::start("S4").await.unwrap();

    let err = client()
        .download(&node.identity(), "does-not-exist")
        .await
        .unwrap_err();

    match &err {
        Error::Rejected {
            status, message, ..
        } => {
            assert_eq!(*status, StatusCode::NOT_FOUND);
            assert_eq!(message, "File metadata not found in system registry");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(err.cause(), "File metadata not found in system registry");
}

#[tokio::test]
async fn test_hashes_lists_chunks() {
    let node = MockNode::start_with_chunk_size("S5", 2).await.unwrap();
    let stored = node.insert_file("abc.bin", b"abcde");

    let listing = client().hashes(&node.identity()).await.unwrap();

    assert_eq!(listing.len(), 1);
    let chunks = &listing[&stored.master_hash];
    assert_eq!(chunks.len(), 3);
    assert!(chunks[0].starts_with("0000_"));
    assert!(chunks[2].starts_with("0002_"));
}

#[tokio::test]
async fn test_attack_wipes_storage() {
    let node = MockNode::start_attackable("S3").await.unwrap();
    node.insert_file("a.txt", b"a");

    let ack = client().attack(&node.identity()).await.unwrap();

    assert_eq!(ack.status, "success");
    assert_eq!(ack.message, "Storage wiped on S3");
    assert!(node.stored_hashes().is_empty());
    assert_eq!(node.attack_requests(), 1);
}

#[tokio::test]
async fn test_attack_on_node_without_endpoint_is_rejected() {
    let node = MockNode::start("S1").await.unwrap();

    let err = client().attack(&node.identity()).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Rejected { status, .. } if status == StatusCode::NOT_FOUND
    ));
}
