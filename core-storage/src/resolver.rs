//! # Locator Resolver
//!
//! Loads and saves blobs through a [`Locator`], composing the crypto codec
//! with the object store.
//!
//! ## Dedup cache
//!
//! The resolver remembers, per plaintext hash, the last encrypted locator it
//! produced or successfully opened. Saving the same plaintext again reuses
//! that locator's key, so one song keeps one key across uploads and exports.
//! The IV is still fresh on every save.
//!
//! ## Ordering
//!
//! Within a single `save`, the key lookup (or generation) happens before
//! encryption, which happens before `put`. No ordering is promised across
//! concurrent calls. The cache lock is never held across an `.await`.

use crate::codec::{self, ContentHash, EncryptionKey};
use crate::error::{Result, StorageError};
use crate::locator::Locator;
use crate::retry::RetryingObjectStore;
use bridge_traits::{
    http::{HttpClient, HttpRequest},
    object_store::ObjectStore,
};
use bytes::Bytes;
use core_runtime::config::{BlobScheme, CoreConfig};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Buffers at least this large are hashed and sealed on the blocking pool.
pub const OFFLOAD_THRESHOLD: usize = 256 * 1024;

/// Result of [`LocatorResolver::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    pub locator: Locator,
    /// Hash of the plaintext that was saved
    pub hash: ContentHash,
}

pub struct LocatorResolver {
    store: Arc<dyn ObjectStore>,
    http_client: Option<Arc<dyn HttpClient>>,
    fetch_timeout: Option<Duration>,
    dedup: Mutex<HashMap<ContentHash, Locator>>,
}

impl LocatorResolver {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            http_client: None,
            fetch_timeout: None,
            dedup: Mutex::new(HashMap::new()),
        }
    }

    /// Build a resolver whose store reads are time-bounded and retried as
    /// configured.
    pub fn from_config(config: &CoreConfig) -> Self {
        let store = RetryingObjectStore::new(
            config.object_store.clone(),
            config.fetch_timeout,
            config.retry_policy.clone(),
        );

        let mut resolver = Self::new(Arc::new(store));
        resolver.fetch_timeout = Some(config.fetch_timeout);
        resolver.http_client = config.http_client.clone();
        resolver
    }

    /// Enable `http:`/`https:` locators.
    pub fn with_http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Load the plaintext behind a locator URL.
    pub async fn load(&self, url: &str) -> Result<Bytes> {
        let locator = Locator::parse(url)?;
        self.load_locator(&locator).await
    }

    #[instrument(skip(self, locator), fields(locator = %locator.redacted()))]
    pub async fn load_locator(&self, locator: &Locator) -> Result<Bytes> {
        match locator {
            Locator::Plain { address } => {
                let data = self.store.get(address).await?;
                debug!(size = data.len(), "Loaded plain blob");
                Ok(data)
            }
            Locator::Encrypted { address, key } => {
                let sealed = self.store.get(address).await?;
                let key = key.clone();
                let (plaintext, hash) = offload(sealed.len(), move || {
                    let plaintext = codec::decrypt(&sealed, &key)?;
                    let hash = codec::hash(&plaintext);
                    Ok((plaintext, hash))
                })
                .await?;

                debug!(size = plaintext.len(), %hash, "Decrypted blob");
                self.dedup.lock().insert(hash, locator.clone());
                Ok(plaintext)
            }
            Locator::Http { url } => self.fetch(url).await,
        }
    }

    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let client = self.http_client.as_ref().ok_or_else(|| {
            StorageError::UnsupportedScheme(format!("{} (no HTTP client configured)", scheme_of(url)))
        })?;

        let mut request = HttpRequest::get(url);
        if let Some(timeout) = self.fetch_timeout {
            request = request.timeout(timeout);
        }

        let response = client.execute(request).await?;
        if !response.is_success() {
            return Err(StorageError::NotFound(format!(
                "{} returned HTTP {}",
                core_runtime::logging::redact_locator(url),
                response.status
            )));
        }

        debug!(size = response.body.len(), "Fetched blob over HTTP");
        Ok(response.body)
    }

    /// Save `data` under `scheme` and return its locator and plaintext hash.
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn save(&self, scheme: BlobScheme, data: Bytes) -> Result<SavedBlob> {
        let len = data.len();
        let hash = {
            let data = data.clone();
            offload(len, move || Ok(codec::hash(&data))).await?
        };

        let locator = match scheme {
            BlobScheme::Plain => {
                let address = self.store.put(data).await?;
                Locator::plain(address)
            }
            BlobScheme::Encrypted => {
                let key = self.key_for(&hash);
                let sealed = {
                    let key = key.clone();
                    offload(len, move || codec::encrypt(&data, &key)).await?
                };
                let address = self.store.put(sealed).await?;
                let locator = Locator::encrypted(address, key);
                self.dedup.lock().insert(hash.clone(), locator.clone());
                locator
            }
        };

        info!(locator = %locator.redacted(), %hash, "Saved blob");
        Ok(SavedBlob { locator, hash })
    }

    /// Save using a scheme given by name.
    pub async fn save_as(&self, scheme: &str, data: Bytes) -> Result<SavedBlob> {
        let scheme = scheme
            .parse::<BlobScheme>()
            .map_err(|_| StorageError::UnsupportedScheme(scheme.to_string()))?;
        self.save(scheme, data).await
    }

    fn key_for(&self, hash: &ContentHash) -> EncryptionKey {
        let cached = self.dedup.lock().get(hash).and_then(|l| l.key().cloned());
        match cached {
            Some(key) => {
                debug!(%hash, "Reusing key from dedup cache");
                key
            }
            None => EncryptionKey::generate(),
        }
    }

    /// Backfill the dedup cache from a known record.
    ///
    /// Only encrypted locators are remembered, and an existing entry is never
    /// replaced. Returns whether the entry was inserted.
    pub fn remember(&self, hash: &ContentHash, locator: &Locator) -> bool {
        if !locator.is_encrypted() {
            return false;
        }
        let mut dedup = self.dedup.lock();
        if dedup.contains_key(hash) {
            return false;
        }
        dedup.insert(hash.clone(), locator.clone());
        true
    }

    pub fn cached_locator(&self, hash: &ContentHash) -> Option<Locator> {
        self.dedup.lock().get(hash).cloned()
    }

    /// Number of hashes in the dedup cache.
    pub fn cached_len(&self) -> usize {
        self.dedup.lock().len()
    }
}

fn scheme_of(url: &str) -> &str {
    url.split_once(':').map(|(scheme, _)| scheme).unwrap_or(url)
}

/// Run CPU-bound codec work inline for small buffers, on the blocking pool
/// otherwise.
async fn offload<T, F>(len: usize, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    if len < OFFLOAD_THRESHOLD {
        return work();
    }
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_desktop::MemoryObjectStore;
    use bridge_traits::{
        error::Result as BridgeResult,
        http::HttpResponse,
    };
    use mockall::mock;
    use std::collections::HashMap as Headers;

    mock! {
        pub Http {}

        #[async_trait::async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    fn resolver() -> (Arc<MemoryObjectStore>, LocatorResolver) {
        let store = Arc::new(MemoryObjectStore::new());
        let resolver = LocatorResolver::new(store.clone());
        (store, resolver)
    }

    fn response(status: u16, body: &'static [u8]) -> HttpResponse {
        HttpResponse {
            status,
            headers: Headers::new(),
            body: Bytes::from_static(body),
        }
    }

    #[tokio::test]
    async fn test_plain_save_and_load() {
        let (_, resolver) = resolver();
        let saved = resolver
            .save(BlobScheme::Plain, Bytes::from_static(b"plain audio"))
            .await
            .unwrap();

        assert_eq!(saved.locator.scheme(), "plain");
        assert_eq!(saved.hash, codec::hash(b"plain audio"));
        assert_eq!(resolver.cached_len(), 0);

        let loaded = resolver.load(&saved.locator.to_string()).await.unwrap();
        assert_eq!(loaded.as_ref(), b"plain audio");
    }

    #[tokio::test]
    async fn test_encrypted_save_stores_ciphertext() {
        let (store, resolver) = resolver();
        let saved = resolver
            .save(BlobScheme::Encrypted, Bytes::from_static(b"secret audio"))
            .await
            .unwrap();

        let address = saved.locator.address().unwrap();
        let stored = store.get(address).await.unwrap();
        assert_ne!(stored.as_ref(), b"secret audio");

        let loaded = resolver.load(&saved.locator.to_string()).await.unwrap();
        assert_eq!(loaded.as_ref(), b"secret audio");
        assert_eq!(codec::hash(&loaded), saved.hash);
    }

    #[tokio::test]
    async fn test_repeated_encrypted_save_reuses_key() {
        let (store, resolver) = resolver();
        let data = Bytes::from_static(b"same song twice");

        let first = resolver.save(BlobScheme::Encrypted, data.clone()).await.unwrap();
        let second = resolver.save(BlobScheme::Encrypted, data).await.unwrap();

        assert_eq!(first.hash, second.hash);
        assert_eq!(first.locator.key(), second.locator.key());
        // Fresh IV per save, so the ciphertexts land at different addresses.
        assert_ne!(first.locator.address(), second.locator.address());
        assert_eq!(store.len(), 2);
        assert_eq!(resolver.cached_locator(&second.hash), Some(second.locator));
    }

    #[tokio::test]
    async fn test_distinct_plaintexts_get_distinct_keys() {
        let (_, resolver) = resolver();
        let a = resolver.save(BlobScheme::Encrypted, Bytes::from_static(b"a")).await.unwrap();
        let b = resolver.save(BlobScheme::Encrypted, Bytes::from_static(b"b")).await.unwrap();
        assert_ne!(a.locator.key(), b.locator.key());
    }

    #[tokio::test]
    async fn test_loading_foreign_locator_records_it() {
        let (store, writer) = resolver();
        let saved = writer
            .save(BlobScheme::Encrypted, Bytes::from_static(b"shared"))
            .await
            .unwrap();

        let reader = LocatorResolver::new(store);
        assert!(reader.cached_locator(&saved.hash).is_none());

        reader.load(&saved.locator.to_string()).await.unwrap();
        assert_eq!(reader.cached_locator(&saved.hash), Some(saved.locator.clone()));

        let again = reader
            .save(BlobScheme::Encrypted, Bytes::from_static(b"shared"))
            .await
            .unwrap();
        assert_eq!(again.locator.key(), saved.locator.key());
    }

    #[tokio::test]
    async fn test_remember_inserts_only_absent_encrypted_entries() {
        let (_, resolver) = resolver();
        let hash = codec::hash(b"song");
        let first = Locator::encrypted(
            "addr-one".parse().unwrap(),
            EncryptionKey::generate(),
        );
        let second = Locator::encrypted(
            "addr-two".parse().unwrap(),
            EncryptionKey::generate(),
        );

        assert!(!resolver.remember(&hash, &Locator::plain("addr".parse().unwrap())));
        assert!(resolver.remember(&hash, &first));
        assert!(!resolver.remember(&hash, &second));
        assert_eq!(resolver.cached_locator(&hash), Some(first));
    }

    #[tokio::test]
    async fn test_wrong_key_is_decrypt_error() {
        let (_, resolver) = resolver();
        let saved = resolver
            .save(BlobScheme::Encrypted, Bytes::from_static(b"locked"))
            .await
            .unwrap();

        let forged = Locator::encrypted(
            saved.locator.address().unwrap().clone(),
            EncryptionKey::generate(),
        );
        let err = resolver.load_locator(&forged).await.unwrap_err();
        assert!(matches!(err, StorageError::Decrypt(_)));
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let (_, resolver) = resolver();
        let err = resolver.load("plain:nowhere").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unsupported_schemes() {
        let (_, resolver) = resolver();
        assert!(matches!(
            resolver.load("magnet:?xt=urn").await,
            Err(StorageError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            resolver.load("https://example.org/catalog.json").await,
            Err(StorageError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            resolver.save_as("rot13", Bytes::from_static(b"x")).await,
            Err(StorageError::UnsupportedScheme(_))
        ));
    }

    #[tokio::test]
    async fn test_http_locators_use_client() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|req| req.url == "https://example.org/catalog.json")
            .times(1)
            .returning(|_| Ok(response(200, b"[]")));
        http.expect_execute()
            .withf(|req| req.url == "https://example.org/missing.json")
            .times(1)
            .returning(|_| Ok(response(404, b"")));

        let (_, resolver) = resolver();
        let resolver = resolver.with_http_client(Arc::new(http));

        let body = resolver.load("https://example.org/catalog.json").await.unwrap();
        assert_eq!(body.as_ref(), b"[]");

        let err = resolver.load("https://example.org/missing.json").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_large_blobs_roundtrip_through_blocking_pool() {
        let (_, resolver) = resolver();
        let data = Bytes::from(vec![0x5a; OFFLOAD_THRESHOLD + 1]);

        let saved = resolver.save(BlobScheme::Encrypted, data.clone()).await.unwrap();
        let loaded = resolver.load_locator(&saved.locator).await.unwrap();
        assert_eq!(loaded, data);
    }
}
