//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - [`MemoryObjectStore`] - in-process content-addressed store
//! - [`FsObjectStore`] - content-addressed directory with atomic writes
//! - [`IpfsObjectStore`] - IPFS node via the HTTP RPC API (`ipfs` feature)
//! - [`ReqwestHttpClient`] - `HttpClient` using `reqwest`
//!
//! Tag reading lives in `core-metadata`; audio output is left to the host.
//!
//! ## Feature Flags
//!
//! - `ipfs`: Enable the IPFS RPC object store
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FsObjectStore, ReqwestHttpClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FsObjectStore::in_data_dir();
//!     let http_client = ReqwestHttpClient::new()?;
//!
//!     // Use in core configuration
//!     Ok(())
//! }
//! ```

mod filesystem;
mod http;
mod memory;

#[cfg(feature = "ipfs")]
mod ipfs;

pub use filesystem::FsObjectStore;
pub use http::ReqwestHttpClient;
pub use memory::MemoryObjectStore;

#[cfg(feature = "ipfs")]
pub use ipfs::{IpfsObjectStore, DEFAULT_API_URL as DEFAULT_IPFS_API_URL};
