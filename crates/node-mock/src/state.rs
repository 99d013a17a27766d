use std::collections::BTreeMap;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use shardwatch_topology::NodeId;

/// A file held by a mock node.
#[derive(Clone, Debug)]
pub struct StoredFile {
    /// Name the file was uploaded under.
    pub filename: String,

    /// SHA-256 of the content, hex encoded.
    pub master_hash: String,

    /// Hash over the concatenated chunk hashes.
    pub integrity_hash: String,

    /// Chunk file names, `{index:04}_{chunk_hash}`.
    pub chunks: Vec<String>,

    /// The original content.
    pub content: Bytes,
}

#[derive(Debug, Default)]
pub struct Knobs {
    pub download_pending: bool,
    pub failing: bool,
    pub peers: Vec<String>,
    pub status_delay: Duration,
    pub upload_delay: Duration,
}

#[derive(Debug, Default)]
pub struct Counters {
    pub attack: usize,
    pub status: usize,
}

#[derive(Debug)]
pub struct MockState {
    pub chunk_size: usize,
    pub counters: Mutex<Counters>,
    pub files: Mutex<BTreeMap<String, StoredFile>>,
    pub id: NodeId,
    pub knobs: Mutex<Knobs>,
}

impl MockState {
    pub fn new(id: NodeId, chunk_size: usize) -> Self {
        Self {
            chunk_size,
            counters: Mutex::new(Counters::default()),
            files: Mutex::new(BTreeMap::new()),
            id,
            knobs: Mutex::new(Knobs::default()),
        }
    }

    pub fn store(&self, filename: &str, content: &[u8]) -> StoredFile {
        let master_hash = sha256_hex(content);

        let chunk_hashes: Vec<String> = if content.is_empty() {
            vec![sha256_hex(&[])]
        } else {
            content.chunks(self.chunk_size).map(sha256_hex).collect()
        };
        let chunks = chunk_hashes
            .iter()
            .enumerate()
            .map(|(index, hash)| format!("{index:04}_{hash}"))
            .collect();
        let integrity_hash = sha256_hex(chunk_hashes.concat().as_bytes());

        let file = StoredFile {
            filename: filename.to_string(),
            master_hash: master_hash.clone(),
            integrity_hash,
            chunks,
            content: Bytes::copy_from_slice(content),
        };
        self.files.lock().insert(master_hash, file.clone());

        file
    }
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
