//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (object store, HTTP,
//! tag reader, audio player) into the library core and exposes the result as
//! a single [`LibraryService`] handle. Desktop apps typically enable the
//! `desktop-shims` feature (which depends on `bridge-desktop`) and call
//! [`bootstrap_desktop`]; other hosts build a [`CoreConfig`] themselves.
//!
//! ## Feature Flags
//!
//! - `desktop-shims` (default): filesystem store and `reqwest` HTTP client
//! - `tag-reader`: `lofty`-based tag reading for uploads
//! - `ipfs`: store blobs on an IPFS node instead of the local filesystem

pub mod command;
pub mod error;
pub mod service;

pub use command::Command;
pub use error::{CoreError, Result};
pub use service::{ImportSummary, LibraryService};

pub use core_runtime::config::{BlobScheme, CoreConfig};
pub use core_runtime::events::{CoreEvent, LibraryEvent, PlaybackEvent};

#[cfg(feature = "desktop-shims")]
pub use desktop::{bootstrap_desktop, DesktopBootstrap};

#[cfg(feature = "desktop-shims")]
mod desktop {
    use crate::error::{CoreError, Result};
    use crate::service::LibraryService;
    use bridge_desktop::{FsObjectStore, ReqwestHttpClient};
    use bridge_traits::object_store::ObjectStore;
    use bridge_traits::playback::PlayerFactory;
    use core_runtime::config::{BlobScheme, CoreConfig};
    use core_runtime::logging::{init_logging, LoggingConfig};
    use std::path::PathBuf;
    use std::sync::Arc;
    use tracing::info;

    /// Options for [`bootstrap_desktop`].
    #[derive(Default)]
    pub struct DesktopBootstrap {
        /// Blob directory; the platform data directory when unset.
        pub data_dir: Option<PathBuf>,
        /// IPFS RPC endpoint. Takes precedence over `data_dir`.
        #[cfg(feature = "ipfs")]
        pub ipfs_api_url: Option<String>,
        /// Audio output supplied by the host shell.
        pub player_factory: Option<Arc<dyn PlayerFactory>>,
        pub page_size: Option<usize>,
        pub export_scheme: Option<BlobScheme>,
        /// Install the global subscriber before anything logs.
        pub logging: Option<LoggingConfig>,
    }

    impl DesktopBootstrap {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
            self.data_dir = Some(dir.into());
            self
        }

        #[cfg(feature = "ipfs")]
        pub fn ipfs_api_url(mut self, url: impl Into<String>) -> Self {
            self.ipfs_api_url = Some(url.into());
            self
        }

        pub fn player_factory(mut self, factory: Arc<dyn PlayerFactory>) -> Self {
            self.player_factory = Some(factory);
            self
        }

        pub fn page_size(mut self, size: usize) -> Self {
            self.page_size = Some(size);
            self
        }

        pub fn export_scheme(mut self, scheme: BlobScheme) -> Self {
            self.export_scheme = Some(scheme);
            self
        }

        pub fn logging(mut self, config: LoggingConfig) -> Self {
            self.logging = Some(config);
            self
        }

        fn object_store(&self) -> Result<Arc<dyn ObjectStore>> {
            #[cfg(feature = "ipfs")]
            if let Some(url) = &self.ipfs_api_url {
                let store = bridge_desktop::IpfsObjectStore::new(url.clone())
                    .map_err(|e| CoreError::InitializationFailed(e.to_string()))?;
                return Ok(Arc::new(store));
            }

            let store = match &self.data_dir {
                Some(dir) => FsObjectStore::new(dir.clone()),
                None => FsObjectStore::in_data_dir(),
            };
            Ok(Arc::new(store))
        }
    }

    /// Build a [`LibraryService`] from the desktop adapters.
    pub fn bootstrap_desktop(options: DesktopBootstrap) -> Result<LibraryService> {
        if let Some(logging) = options.logging.clone() {
            init_logging(logging)?;
        }

        let http_client = ReqwestHttpClient::new()
            .map_err(|e| CoreError::InitializationFailed(format!("HTTP client: {}", e)))?;

        let mut builder = CoreConfig::builder()
            .object_store(options.object_store()?)
            .http_client(Arc::new(http_client));

        #[cfg(feature = "tag-reader")]
        {
            builder = builder.tag_reader(Arc::new(core_metadata::LoftyTagReader::new()));
        }

        if let Some(factory) = options.player_factory.clone() {
            builder = builder.player_factory(factory);
        }
        if let Some(size) = options.page_size {
            builder = builder.page_size(size);
        }
        if let Some(scheme) = options.export_scheme {
            builder = builder.export_scheme(scheme);
        }

        let service = LibraryService::new(builder.build()?)?;
        info!("Desktop bootstrap complete");
        Ok(service)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_bootstrap_applies_options() {
            let dir = tempfile::tempdir().unwrap();
            let service = bootstrap_desktop(
                DesktopBootstrap::new()
                    .data_dir(dir.path())
                    .page_size(25)
                    .export_scheme(BlobScheme::Plain),
            )
            .unwrap();

            assert_eq!(service.config().page_size, 25);
            assert_eq!(service.config().export_scheme, BlobScheme::Plain);
            assert!(service.config().http_client.is_some());
            assert!(service.config().player_factory.is_none());
            assert_eq!(
                service.config().tag_reader.is_some(),
                cfg!(feature = "tag-reader")
            );
        }

        #[test]
        fn test_bootstrap_rejects_bad_page_size() {
            let dir = tempfile::tempdir().unwrap();
            let err = bootstrap_desktop(DesktopBootstrap::new().data_dir(dir.path()).page_size(0))
                .unwrap_err();
            assert!(matches!(err, CoreError::InitializationFailed(_)));
        }
    }
}
