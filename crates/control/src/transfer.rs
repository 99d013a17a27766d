use std::path::Path;

use bytes::Bytes;
use shardwatch_node_client::{NodeClient, TransferResult};
use shardwatch_topology::{ClusterTopology, NodeId, NodeIdentity};
use tracing::{info, warn};

use crate::{Error, Operation, PendingOperations, Result};

/// Moves content in and out of the cluster through one chosen node.
#[derive(Clone, Debug)]
pub struct TransferCoordinator {
    client: NodeClient,
    pending: PendingOperations,
    topology: ClusterTopology,
}

impl TransferCoordinator {
    /// Create a coordinator. Pass the same [`PendingOperations`] to every
    /// component that should share in-flight slots.
    #[must_use]
    pub const fn new(
        topology: ClusterTopology,
        client: NodeClient,
        pending: PendingOperations,
    ) -> Self {
        Self {
            client,
            pending,
            topology,
        }
    }

    /// Whether an upload or download is in flight.
    #[must_use]
    pub fn is_pending(&self, operation: Operation) -> bool {
        self.pending.is_pending(operation)
    }

    /// Upload `content` to `node` under `filename`. The node's receipt is
    /// returned as-is.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownNode`] for an unconfigured node,
    /// [`Error::OperationPending`] while another upload runs, and
    /// [`Error::UploadFailed`] carrying the node's message otherwise.
    pub async fn upload(
        &self,
        node: &NodeId,
        filename: &str,
        content: Bytes,
    ) -> Result<TransferResult> {
        let node = self.resolve(node)?;
        let _guard = self.pending.acquire(Operation::Upload)?;

        info!("Uploading {} ({} bytes) to {}", filename, content.len(), node);

        let receipt = self
            .client
            .upload(node, filename, content)
            .await
            .map_err(|e| {
                warn!("Upload of {} to {} failed: {}", filename, node.id, e);
                Error::UploadFailed { cause: e.cause() }
            })?;

        info!(
            "Stored {} as {} in {} chunks",
            receipt.filename, receipt.master_hash, receipt.chunk_count
        );

        Ok(receipt)
    }

    /// Read a local file and upload it under its final path component.
    ///
    /// # Errors
    ///
    /// As [`upload`](Self::upload), plus [`Error::ReadFile`] when the file
    /// cannot be read.
    pub async fn upload_path(
        &self,
        node: &NodeId,
        path: impl AsRef<Path>,
    ) -> Result<TransferResult> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::ReadFile {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            })?;

        let content = tokio::fs::read(path).await.map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        self.upload(node, &filename, Bytes::from(content)).await
    }

    /// Retrieve content by master hash from `node`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnknownNode`] for an unconfigured node and
    /// [`Error::OperationPending`] while another download runs. Every other
    /// failure is [`Error::DownloadFailed`]; the cause is only logged.
    pub async fn download(&self, node: &NodeId, master_hash: &str) -> Result<Bytes> {
        let node = self.resolve(node)?;
        let _guard = self.pending.acquire(Operation::Download)?;

        info!("Downloading {} from {}", master_hash, node);

        match self.client.download(node, master_hash).await {
            Ok(content) => {
                info!("Retrieved {} bytes for {}", content.len(), master_hash);
                Ok(content)
            }
            Err(e) => {
                warn!("Download of {} from {} failed: {}", master_hash, node.id, e);
                Err(Error::DownloadFailed)
            }
        }
    }

    fn resolve(&self, id: &NodeId) -> Result<&NodeIdentity> {
        self.topology
            .node(id)
            .ok_or_else(|| Error::UnknownNode(id.clone()))
    }
}
