//! HTTP client for the storage node contract.
//!
//! A [`NodeClient`] is stateless with respect to nodes: every call names the
//! [`NodeIdentity`] it targets, is bounded by the matching timeout from
//! [`Timeouts`], and never retries. Transport failures and timeouts come back
//! as [`Error::NodeUnreachable`]; raw `reqwest` errors never escape on their
//! own.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
    AttackAck, InventoryListing, NodeProbe, NodeStatus, StatusPayload, TransferResult,
};

use std::time::Duration;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shardwatch_topology::{NodeIdentity, Timeouts};
use tracing::{debug, trace};

use types::DownloadRequest;

static USER_AGENT: &str = concat!("shardwatch/", env!("CARGO_PKG_VERSION"));

/// Issues status, inventory, transfer and attack calls to storage nodes.
#[derive(Clone, Debug)]
pub struct NodeClient {
    client: Client,
    timeouts: Timeouts,
}

impl NodeClient {
    /// Creates a new `NodeClient` using the given per-call timeouts.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(timeouts: Timeouts) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(Error::Client)?;

        Ok(Self { client, timeouts })
    }

    /// The timeouts applied to each call.
    #[must_use]
    pub const fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Probes a node's liveness. Never fails: unreachability and bad replies
    /// are folded into the returned [`NodeStatus`].
    pub async fn status(&self, node: &NodeIdentity) -> NodeStatus {
        let probe = match self.fetch_status(node).await {
            Ok(payload) => NodeProbe::Online(payload),
            Err(Error::NodeUnreachable { source, .. }) => {
                debug!("Node {} unreachable: {}", node.id, source);
                NodeProbe::Unreachable
            }
            Err(e) => {
                debug!("Node {} answered status with an error: {}", node.id, e);
                NodeProbe::Error(e.cause())
            }
        };

        NodeStatus::new(node.id.clone(), probe)
    }

    /// Fetches the raw status payload.
    ///
    /// # Errors
    ///
    /// This function will return an error if the node cannot be reached in
    /// time, rejects the request, or replies with something other than a JSON
    /// object.
    pub async fn fetch_status(&self, node: &NodeIdentity) -> Result<StatusPayload> {
        let request = self.client.get(node.endpoint("status"));
        let response = self.send(node, request, self.timeouts.status).await?;

        read_json(node, response).await
    }

    /// Lists the master hashes and chunk files a node holds. Diagnostic only.
    ///
    /// # Errors
    ///
    /// This function will return an error if the node cannot be reached in
    /// time, rejects the request, or replies with an unexpected body.
    pub async fn hashes(&self, node: &NodeIdentity) -> Result<InventoryListing> {
        let request = self.client.get(node.endpoint("hashes"));
        let response = self.send(node, request, self.timeouts.hashes).await?;

        read_json(node, response).await
    }

    /// Uploads `content` as multipart field `file`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the node cannot be reached in
    /// time, rejects the upload, or replies without a valid receipt.
    pub async fn upload(
        &self,
        node: &NodeIdentity,
        filename: &str,
        content: Bytes,
    ) -> Result<TransferResult> {
        let length = content.len() as u64;
        let part = Part::stream_with_length(content, length).file_name(filename.to_string());
        let form = Form::new().part("file", part);

        debug!("Uploading {} ({} bytes) to {}", filename, length, node.id);
        let request = self.client.post(node.endpoint("upload")).multipart(form);
        let response = self.send(node, request, self.timeouts.upload).await?;

        read_json(node, response).await
    }

    /// Downloads the content stored under `master_hash`.
    ///
    /// # Errors
    ///
    /// This function will return an error if the node cannot be reached in
    /// time, does not have (or has not yet restored) the content, or the
    /// body cannot be read.
    pub async fn download(&self, node: &NodeIdentity, master_hash: &str) -> Result<Bytes> {
        debug!("Downloading {} from {}", master_hash, node.id);
        let request = self
            .client
            .post(node.endpoint("download"))
            .json(&DownloadRequest { master_hash });
        let response = self.send(node, request, self.timeouts.download).await?;

        response
            .bytes()
            .await
            .map_err(|source| Error::NodeUnreachable {
                node: node.id.clone(),
                source,
            })
    }

    /// Sends the attack command.
    ///
    /// # Errors
    ///
    /// This function will return an error if the node cannot be reached in
    /// time, does not serve the attack endpoint, or replies with an
    /// unexpected body.
    pub async fn attack(&self, node: &NodeIdentity) -> Result<AttackAck> {
        let request = self.client.post(node.endpoint("attack"));
        let response = self.send(node, request, self.timeouts.attack).await?;

        read_json(node, response).await
    }

    async fn send(
        &self,
        node: &NodeIdentity,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Response> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| Error::NodeUnreachable {
                node: node.id.clone(),
                source,
            })?;

        let status = response.status();
        trace!("{} {}", node.id, status);
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::Rejected {
            node: node.id.clone(),
            status,
            message: node_message(&body, status.canonical_reason()),
        })
    }
}

async fn read_json<T: DeserializeOwned>(node: &NodeIdentity, response: Response) -> Result<T> {
    let body = response
        .bytes()
        .await
        .map_err(|source| Error::NodeUnreachable {
            node: node.id.clone(),
            source,
        })?;

    serde_json::from_slice(&body).map_err(|e| Error::InvalidResponse {
        node: node.id.clone(),
        reason: e.to_string(),
    })
}

/// Extracts the node's own error message from a reply body.
fn node_message(body: &str, fallback: Option<&str>) -> String {
    let message = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            Some(Value::String(detail)) => detail.clone(),
            Some(detail) => detail.to_string(),
            None => body.trim().to_string(),
        },
        _ => body.trim().to_string(),
    };

    if message.is_empty() {
        fallback.unwrap_or("no message").to_string()
    } else {
        message
    }
}
