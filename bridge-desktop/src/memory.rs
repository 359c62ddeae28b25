//! In-process content-addressed store

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    object_store::{ContentAddress, ObjectStore},
};
use bytes::Bytes;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tracing::debug;

/// Address a blob by the lowercase hex SHA-256 of its bytes.
pub(crate) fn sha256_address(data: &[u8]) -> Result<ContentAddress> {
    ContentAddress::new(hex::encode(Sha256::digest(data)))
}

/// Object store that keeps every blob in a `HashMap`.
///
/// Used by tests and by hosts that only need a throwaway library.
#[derive(Default)]
pub struct MemoryObjectStore {
    blobs: RwLock<HashMap<ContentAddress, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs stored.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, data: Bytes) -> Result<ContentAddress> {
        let address = sha256_address(&data)?;
        let size = data.len();
        self.blobs.write().entry(address.clone()).or_insert(data);
        debug!(%address, size, "Stored blob in memory");
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        self.blobs
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("blob {}", address)))
    }
}
