//! Content-Addressed Object Store Abstraction
//!
//! The library keeps every blob (audio files, exported catalogs) in an
//! external store that names data by its content. The core never interprets
//! an address; it only round-trips it through locator URLs.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Opaque content-derived identifier returned by [`ObjectStore::put`].
///
/// The exact encoding (multihash, hex digest, CID) belongs to the store. The
/// only constraints enforced here are the ones locator URLs depend on: the
/// address is non-empty and contains neither `#` nor whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentAddress(String);

impl ContentAddress {
    /// Validate and wrap an address string.
    ///
    /// # Examples
    ///
    /// ```
    /// use bridge_traits::object_store::ContentAddress;
    ///
    /// let address = ContentAddress::new("QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG").unwrap();
    /// assert_eq!(address.as_str().len(), 46);
    ///
    /// assert!(ContentAddress::new("").is_err());
    /// assert!(ContentAddress::new("abc#def").is_err());
    /// ```
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Content address cannot be empty".to_string(),
            ));
        }
        if address.contains('#') || address.chars().any(char::is_whitespace) {
            return Err(BridgeError::OperationFailed(format!(
                "Content address contains forbidden characters: {:?}",
                address
            )));
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentAddress {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ContentAddress {
    type Error = BridgeError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContentAddress> for String {
    fn from(address: ContentAddress) -> Self {
        address.0
    }
}

/// Content-addressed blob store.
///
/// Implementations:
/// - `put` must be idempotent: identical bytes always yield the same address.
/// - `get` must fail with [`BridgeError::NotFound`] when the blob cannot be
///   located. Transport problems should use [`BridgeError::OperationFailed`]
///   or [`BridgeError::Timeout`] so callers can decide whether to retry.
/// - No timeout is imposed at this layer; wrappers in the core add one.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::object_store::ObjectStore;
///
/// async fn roundtrip(store: &dyn ObjectStore) -> Result<()> {
///     let address = store.put(Bytes::from_static(b"hello")).await?;
///     let data = store.get(&address).await?;
///     assert_eq!(&data[..], b"hello");
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an opaque blob and return its content address.
    async fn put(&self, data: Bytes) -> Result<ContentAddress>;

    /// Retrieve the complete blob stored under `address`.
    async fn get(&self, address: &ContentAddress) -> Result<Bytes>;

    /// Check whether a blob is reachable without materializing it.
    async fn contains(&self, address: &ContentAddress) -> Result<bool> {
        match self.get(address).await {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }
}
