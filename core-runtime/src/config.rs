//! # Core Configuration Module
//!
//! Configuration management for the library core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every collaborator and tunable the core needs. It
//! enforces fail-fast validation so a misconfigured host learns about it at
//! startup instead of on the first upload.
//!
//! ## Required Dependencies
//!
//! - `ObjectStore` - where audio blobs and catalog snapshots live
//!
//! ## Optional Dependencies
//!
//! - `HttpClient` - resolves `http:`/`https:` locators (catalog import)
//! - `TagReader` - reads title/artist/album during ingestion
//! - `PlayerFactory` - turns downloaded audio into a playable handle
//!
//! When the `desktop-shims` feature is enabled, a filesystem object store and
//! a reqwest HTTP client are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{BlobScheme, CoreConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .object_store(Arc::new(MyStore))
//!     .tag_reader(Arc::new(MyTagReader))
//!     .page_size(25)
//!     .export_scheme(BlobScheme::Plain)
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{HttpClient, ObjectStore, PlayerFactory, RetryPolicy, TagReader};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Number of search results per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Per-attempt timeout for object store reads.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How a blob is written to the object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlobScheme {
    /// Stored as-is; the locator is `plain:<address>`.
    Plain,
    /// Encrypted with a per-content key; the locator is
    /// `encrypted:<address>#<key>`.
    #[default]
    Encrypted,
}

impl BlobScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobScheme::Plain => "plain",
            BlobScheme::Encrypted => "encrypted",
        }
    }
}

impl fmt::Display for BlobScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlobScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(BlobScheme::Plain),
            "encrypted" => Ok(BlobScheme::Encrypted),
            other => Err(Error::Config(format!("Unknown blob scheme: {}", other))),
        }
    }
}

/// Core configuration for the library.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Content-addressed blob store (required)
    pub object_store: Arc<dyn ObjectStore>,

    /// Generic fetch for `http:`/`https:` locators
    pub http_client: Option<Arc<dyn HttpClient>>,

    /// Tag reader used by ingestion
    pub tag_reader: Option<Arc<dyn TagReader>>,

    /// Player construction for playback
    pub player_factory: Option<Arc<dyn PlayerFactory>>,

    /// Search results per page
    pub page_size: usize,

    /// Scheme used when exporting the catalog
    pub export_scheme: BlobScheme,

    /// Per-attempt timeout for object store reads
    pub fetch_timeout: Duration,

    /// Retry policy for object store reads
    pub retry_policy: RetryPolicy,

    /// Per-subscriber buffer of the event bus
    pub event_buffer_size: usize,
}

impl fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreConfig")
            .field("object_store", &"ObjectStore { ... }")
            .field(
                "http_client",
                &self.http_client.as_ref().map(|_| "HttpClient { ... }"),
            )
            .field(
                "tag_reader",
                &self.tag_reader.as_ref().map(|_| "TagReader { ... }"),
            )
            .field(
                "player_factory",
                &self.player_factory.as_ref().map(|_| "PlayerFactory { ... }"),
            )
            .field("page_size", &self.page_size)
            .field("export_scheme", &self.export_scheme)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("retry_policy", &self.retry_policy)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Page size is within `1..=1000`
    /// - Fetch timeout is non-zero
    /// - Retry policy makes at least one attempt
    /// - Event buffer is non-empty
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::Config(
                "Page size must be greater than 0".to_string(),
            ));
        }

        if self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "Page size exceeds maximum of {}",
                MAX_PAGE_SIZE
            )));
        }

        if self.fetch_timeout.is_zero() {
            return Err(Error::Config(
                "Fetch timeout must be greater than 0".to_string(),
            ));
        }

        if self.retry_policy.max_attempts == 0 {
            return Err(Error::Config(
                "Retry policy must allow at least one attempt".to_string(),
            ));
        }

        if self.retry_policy.base_delay > self.retry_policy.max_delay {
            return Err(Error::Config(
                "Retry base delay cannot exceed the maximum delay".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn object_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "ObjectStore".to_string(),
        message: "An ObjectStore implementation is required to store audio and catalogs. \
                 Desktop: enable the 'desktop-shims' feature to use the default FsObjectStore. \
                 Other hosts: inject a store backed by the platform's content-addressed storage."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_object_store() -> Result<Arc<dyn ObjectStore>> {
    use bridge_desktop::FsObjectStore;

    let store: Arc<dyn ObjectStore> = Arc::new(FsObjectStore::in_data_dir());
    Ok(store)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_object_store() -> Result<Arc<dyn ObjectStore>> {
    Err(object_store_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(Some(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Option<Arc<dyn HttpClient>>> {
    Ok(None)
}

/// Builder for constructing [`CoreConfig`] instances.
#[derive(Default)]
pub struct CoreConfigBuilder {
    object_store: Option<Arc<dyn ObjectStore>>,
    http_client: Option<Arc<dyn HttpClient>>,
    tag_reader: Option<Arc<dyn TagReader>>,
    player_factory: Option<Arc<dyn PlayerFactory>>,
    page_size: Option<usize>,
    export_scheme: Option<BlobScheme>,
    fetch_timeout: Option<Duration>,
    retry_policy: Option<RetryPolicy>,
    event_buffer_size: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the object store implementation (required unless the
    /// `desktop-shims` feature provides a default).
    pub fn object_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.object_store = Some(store);
        self
    }

    /// Sets the HTTP client used for `http:`/`https:` locators.
    ///
    /// Without one, those locators fail with an unsupported-scheme error.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the tag reader used to ingest new files.
    pub fn tag_reader(mut self, reader: Arc<dyn TagReader>) -> Self {
        self.tag_reader = Some(reader);
        self
    }

    /// Sets the player factory used for playback.
    pub fn player_factory(mut self, factory: Arc<dyn PlayerFactory>) -> Self {
        self.player_factory = Some(factory);
        self
    }

    /// Sets the number of search results per page.
    ///
    /// Default: 10
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder().page_size(25);
    /// ```
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Sets the scheme used for catalog exports.
    ///
    /// Default: [`BlobScheme::Encrypted`]
    pub fn export_scheme(mut self, scheme: BlobScheme) -> Self {
        self.export_scheme = Some(scheme);
        self
    }

    /// Sets the per-attempt timeout for object store reads.
    ///
    /// Default: 30 seconds
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Sets the retry policy for object store reads.
    ///
    /// Default: 3 attempts, 200 ms base delay, exponential, capped at 5 s
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - No object store is available
    /// - Configuration values are out of range
    pub fn build(self) -> Result<CoreConfig> {
        let object_store = match self.object_store {
            Some(store) => store,
            None => provide_default_object_store()?,
        };

        let http_client = match self.http_client {
            Some(client) => Some(client),
            None => provide_default_http_client()?,
        };

        let config = CoreConfig {
            object_store,
            http_client,
            tag_reader: self.tag_reader,
            player_factory: self.player_factory,
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            export_scheme: self.export_scheme.unwrap_or_default(),
            fetch_timeout: self.fetch_timeout.unwrap_or(DEFAULT_FETCH_TIMEOUT),
            retry_policy: self.retry_policy.unwrap_or_default(),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::{BridgeError, ContentAddress};
    use bytes::Bytes;

    struct NullStore;

    #[async_trait]
    impl ObjectStore for NullStore {
        async fn put(&self, _data: Bytes) -> std::result::Result<ContentAddress, BridgeError> {
            ContentAddress::new("null")
        }

        async fn get(&self, address: &ContentAddress) -> std::result::Result<Bytes, BridgeError> {
            Err(BridgeError::NotFound(address.to_string()))
        }
    }

    fn builder() -> CoreConfigBuilder {
        CoreConfig::builder().object_store(Arc::new(NullStore))
    }

    #[test]
    fn test_builder_defaults() {
        let config = builder().build().unwrap();

        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.export_scheme, BlobScheme::Encrypted);
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
        assert_eq!(config.retry_policy, RetryPolicy::default());
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
        assert!(config.tag_reader.is_none());
        assert!(config.player_factory.is_none());
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_object_store() {
        let result = CoreConfig::builder().build();
        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "ObjectStore")
            }
            other => panic!("expected CapabilityMissing, got {:?}", other.map(|_| ())),
        }
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = CoreConfig::builder().build().unwrap();
        assert!(config.http_client.is_some());
    }

    #[test]
    fn test_validate_rejects_page_size_out_of_range() {
        assert!(builder().page_size(0).build().is_err());
        assert!(builder().page_size(MAX_PAGE_SIZE + 1).build().is_err());
        assert!(builder().page_size(MAX_PAGE_SIZE).build().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout_and_attempts() {
        assert!(builder().fetch_timeout(Duration::ZERO).build().is_err());

        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(builder().retry_policy(policy).build().is_err());

        let inverted = RetryPolicy {
            base_delay: Duration::from_secs(10),
            max_delay: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        assert!(builder().retry_policy(inverted).build().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_event_buffer() {
        assert!(builder().event_buffer_size(0).build().is_err());
    }

    #[test]
    fn test_blob_scheme_parsing() {
        assert_eq!("plain".parse::<BlobScheme>().unwrap(), BlobScheme::Plain);
        assert_eq!(
            "encrypted".parse::<BlobScheme>().unwrap(),
            BlobScheme::Encrypted
        );
        assert!("ipfs".parse::<BlobScheme>().is_err());
        assert_eq!(BlobScheme::Plain.to_string(), "plain");
    }

    #[test]
    fn test_debug_hides_collaborators() {
        let config = builder().page_size(7).build().unwrap();
        let debug = format!("{:?}", config);
        assert!(debug.contains("ObjectStore { ... }"));
        assert!(debug.contains("page_size: 7"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = builder().export_scheme(BlobScheme::Plain).build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.export_scheme, BlobScheme::Plain);
        assert!(Arc::ptr_eq(&config.object_store, &cloned.object_store));
    }
}
