//! Filesystem-backed content-addressed store using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    object_store::{ContentAddress, ObjectStore},
};
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::memory::sha256_address;

const OBJECTS_DIR: &str = "objects";
const TMP_DIR: &str = "tmp";

/// Content-addressed store rooted at a local directory.
///
/// Layout:
///
/// ```text
/// <root>/objects/<first two hex chars>/<sha256 hex>
/// <root>/tmp/<sha256 hex>.<n>.partial
/// ```
///
/// Writes land in `tmp/` first and are renamed into place, so a reader never
/// observes a half-written object.
pub struct FsObjectStore {
    root: PathBuf,
    tmp_counter: AtomicU64,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tmp_counter: AtomicU64::new(0),
        }
    }

    /// Store under the platform data directory (`$XDG_DATA_HOME/tunes/store`
    /// on Linux), falling back to the temp directory.
    pub fn in_data_dir() -> Self {
        let base = std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share"))
            })
            .unwrap_or_else(std::env::temp_dir);
        Self::new(base.join("tunes").join("store"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map an address onto its object path.
    ///
    /// Only addresses this store could have produced are accepted, which
    /// keeps arbitrary strings from escaping the root.
    fn object_path(&self, address: &ContentAddress) -> Option<PathBuf> {
        let oid = address.as_str();
        if oid.len() != 64 || !oid.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(self.root.join(OBJECTS_DIR).join(&oid[..2]).join(oid))
    }

    fn tmp_path(&self, address: &ContentAddress) -> PathBuf {
        let n = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.root
            .join(TMP_DIR)
            .join(format!("{}.{}.{}.partial", address, std::process::id(), n))
    }
}

/// Write `data` to `tmp` and rename it onto `dest`. `tmp` is removed if any
/// step fails.
async fn persist(tmp: &Path, dest: &Path, data: &[u8]) -> std::io::Result<()> {
    let result = async {
        let mut file = fs::File::create(tmp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(tmp, dest).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(tmp).await;
    }
    result
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, data: Bytes) -> Result<ContentAddress> {
        let address = sha256_address(&data)?;
        let dest = self.object_path(&address).ok_or_else(|| {
            BridgeError::OperationFailed(format!("unusable address {}", address))
        })?;

        if fs::try_exists(&dest).await? {
            debug!(%address, "Blob already present on disk");
            return Ok(address);
        }

        let tmp = self.tmp_path(&address);
        if let Some(parent) = tmp.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).await?;
        }

        persist(&tmp, &dest, &data).await?;

        debug!(%address, size = data.len(), path = ?dest, "Wrote blob");
        Ok(address)
    }

    async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
        let path = self
            .object_path(address)
            .ok_or_else(|| BridgeError::NotFound(format!("blob {}", address)))?;

        match fs::read(&path).await {
            Ok(data) => {
                debug!(%address, size = data.len(), "Read blob");
                Ok(Bytes::from(data))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(BridgeError::NotFound(format!("blob {}", address)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_roundtrip_and_layout() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        let address = store.put(Bytes::from_static(b"audio")).await.unwrap();
        let oid = address.as_str();
        let expected = dir
            .path()
            .join(OBJECTS_DIR)
            .join(&oid[..2])
            .join(oid);

        assert!(expected.exists());
        assert_eq!(&store.get(&address).await.unwrap()[..], b"audio");
    }

    #[tokio::test]
    async fn test_put_twice_yields_same_address() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        let a = store.put(Bytes::from_static(b"x")).await.unwrap();
        let b = store.put(Bytes::from_static(b"x")).await.unwrap();
        assert_eq!(a, b);

        let leftovers = std::fs::read_dir(dir.path().join(TMP_DIR)).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn test_failed_persist_leaves_no_partial_file() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("blob.partial");
        let dest = dir.path().join("occupied");
        std::fs::create_dir_all(dest.join("child")).unwrap();

        assert!(persist(&tmp, &dest, b"audio").await.is_err());
        assert!(!tmp.exists());
        assert!(dest.join("child").exists());
    }

    #[tokio::test]
    async fn test_persist_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("missing").join("blob.partial");
        let dest = dir.path().join("blob");

        assert!(persist(&tmp, &dest, b"audio").await.is_err());
        assert!(!tmp.exists());
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_foreign_addresses_are_not_found() {
        let dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(dir.path());

        let traversal = ContentAddress::new("../../etc/passwd").unwrap();
        assert!(store.get(&traversal).await.unwrap_err().is_not_found());

        let absent = ContentAddress::new("a".repeat(64)).unwrap();
        assert!(store.get(&absent).await.unwrap_err().is_not_found());
    }
}
