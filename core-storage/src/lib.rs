//! # Core Storage
//!
//! Moves opaque audio and catalog blobs in and out of a content-addressed
//! object store, optionally sealed with AES-256-GCM.
//!
//! ## Overview
//!
//! - [`codec`] - content hashing and blob encryption
//! - [`locator`] - `plain:` / `encrypted:` / `http(s):` locator URLs
//! - [`resolver`] - [`LocatorResolver`], which loads and saves through a
//!   locator and keeps the plaintext-hash to key dedup cache
//! - [`retry`] - [`RetryingObjectStore`], a time-bounded retrying wrapper
//!
//! ## Usage
//!
//! ```ignore
//! use core_storage::LocatorResolver;
//! use core_runtime::config::BlobScheme;
//!
//! let resolver = LocatorResolver::from_config(&config);
//! let saved = resolver.save(BlobScheme::Encrypted, audio).await?;
//! let audio = resolver.load(&saved.locator.to_string()).await?;
//! ```

pub mod codec;
pub mod error;
pub mod locator;
pub mod resolver;
pub mod retry;

pub use codec::{ContentHash, EncryptionKey};
pub use error::{Result, StorageError};
pub use locator::Locator;
pub use resolver::{LocatorResolver, SavedBlob};
pub use retry::RetryingObjectStore;
