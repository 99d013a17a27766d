//! A mock storage node speaking the node HTTP contract. Used for testing.
//!
//! Each [`MockNode`] binds an ephemeral localhost port and serves
//! `/status`, `/hashes`, `/upload`, `/download` and (optionally) `/attack`
//! from an in-memory file table. Knobs allow tests to delay status and upload
//! replies, fail every request, or make downloads look like they are still
//! healing.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod handlers;
mod state;

pub use state::StoredFile;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use shardwatch_topology::{NodeId, NodeIdentity};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error};
use url::Url;

use state::MockState;

/// Size of the chunks stored files are split into.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// A running mock storage node.
///
/// The server is aborted when the value is dropped.
pub struct MockNode {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    id: NodeId,
    state: Arc<MockState>,
}

impl MockNode {
    /// Start a node without an attack endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port could be bound.
    pub async fn start(id: impl Into<NodeId>) -> std::io::Result<Self> {
        Self::spawn(id.into(), false, DEFAULT_CHUNK_SIZE).await
    }

    /// Start a node that also serves `POST /attack`.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port could be bound.
    pub async fn start_attackable(id: impl Into<NodeId>) -> std::io::Result<Self> {
        Self::spawn(id.into(), true, DEFAULT_CHUNK_SIZE).await
    }

    /// Start a node with a custom chunk size.
    ///
    /// # Errors
    ///
    /// Returns an error if no local port could be bound.
    pub async fn start_with_chunk_size(
        id: impl Into<NodeId>,
        chunk_size: usize,
    ) -> std::io::Result<Self> {
        Self::spawn(id.into(), false, chunk_size.max(1)).await
    }

    async fn spawn(id: NodeId, attackable: bool, chunk_size: usize) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(MockState::new(id.clone(), chunk_size));

        let mut router = Router::new()
            .route("/status", get(handlers::status))
            .route("/hashes", get(handlers::hashes))
            .route("/upload", post(handlers::upload))
            .route("/download", post(handlers::download));
        if attackable {
            router = router.route("/attack", post(handlers::attack));
        }
        let router = router.with_state(state.clone());

        debug!("mock node {} listening on {}", id, addr);
        let node_id = id.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                error!("mock node {} stopped: {}", node_id, e);
            }
        });

        Ok(Self {
            addr,
            handle,
            id,
            state,
        })
    }

    /// The node's id.
    #[must_use]
    pub const fn id(&self) -> &NodeId {
        &self.id
    }

    /// Base URL the node is served from.
    ///
    /// # Panics
    ///
    /// Never in practice: the address is always a valid socket address.
    #[must_use]
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("socket address is a valid origin")
    }

    /// Identity to put in a cluster topology.
    #[must_use]
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(self.id.clone(), self.url())
    }

    /// Delay every `/status` reply by `delay`.
    pub fn set_status_delay(&self, delay: Duration) {
        self.state.knobs.lock().status_delay = delay;
    }

    /// Delay every `/upload` reply by `delay`.
    pub fn set_upload_delay(&self, delay: Duration) {
        self.state.knobs.lock().upload_delay = delay;
    }

    /// Make every endpoint answer `500` with a JSON `detail`.
    pub fn set_failing(&self, failing: bool) {
        self.state.knobs.lock().failing = failing;
    }

    /// Make `/download` answer `404` as if chunks were still being restored.
    pub fn set_download_pending(&self, pending: bool) {
        self.state.knobs.lock().download_pending = pending;
    }

    /// Peers reported in the status payload.
    pub fn set_peers(&self, peers: Vec<String>) {
        self.state.knobs.lock().peers = peers;
    }

    /// Put a file straight into storage, bypassing `/upload`.
    pub fn insert_file(&self, filename: &str, content: &[u8]) -> StoredFile {
        self.state.store(filename, content)
    }

    /// Master hashes currently stored.
    #[must_use]
    pub fn stored_hashes(&self) -> Vec<String> {
        self.state.files.lock().keys().cloned().collect()
    }

    /// Number of `/status` requests received.
    #[must_use]
    pub fn status_requests(&self) -> usize {
        self.state.counters.lock().status
    }

    /// Number of `/attack` requests received.
    #[must_use]
    pub fn attack_requests(&self) -> usize {
        self.state.counters.lock().attack
    }

    /// Stop accepting connections. Requests on new connections fail to
    /// connect; already open keep-alive connections may still be served.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start one mock node per id, in order. Only `attack_target` serves
/// `/attack`.
///
/// # Errors
///
/// Returns an error if any node fails to bind.
pub async fn start_cluster<I, S>(ids: I, attack_target: &str) -> std::io::Result<Vec<MockNode>>
where
    I: IntoIterator<Item = S>,
    S: Into<NodeId>,
{
    let mut nodes = Vec::new();
    for id in ids {
        let id = id.into();
        let node = if id.as_str() == attack_target {
            MockNode::start_attackable(id).await?
        } else {
            MockNode::start(id).await?
        };
        nodes.push(node);
    }
    Ok(nodes)
}
