//! # Host Bridge Traits
//!
//! Contracts between the library core and the collaborators it does not own.
//!
//! ## Overview
//!
//! The core stores and retrieves opaque blobs, fetches catalogs over HTTP,
//! reads tags out of audio buffers and drives a platform player. None of those
//! capabilities live in the core itself; each one is expressed here as a trait
//! that a host (desktop shell, test harness, mobile app) implements.
//!
//! ## Traits
//!
//! ### Storage & Network
//! - [`ObjectStore`](object_store::ObjectStore) - Content-addressed blob `put`/`get`
//! - [`HttpClient`](http::HttpClient) - Generic fetch for `http:`/`https:` locators
//!
//! ### Audio
//! - [`TagReader`](playback::TagReader) - Title/artist/album from an in-memory buffer
//! - [`PlayerFactory`](playback::PlayerFactory) - Builds a [`PlayerHandle`](playback::PlayerHandle)
//!   that reports [`PlayerEvent`](playback::PlayerEvent)s over a channel
//!
//! ### Utilities
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to host logging
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should map "the thing is not there" onto [`BridgeError::NotFound`] so the
//! core can tell a missing blob apart from a broken transport.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single implementation can be
//! shared behind an `Arc` across tasks of the multi-threaded runtime.
//!
//! ## Examples
//!
//! ### Implementing ObjectStore
//!
//! ```ignore
//! use bridge_traits::object_store::{ContentAddress, ObjectStore};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//! use bytes::Bytes;
//!
//! pub struct MyStore;
//!
//! #[async_trait]
//! impl ObjectStore for MyStore {
//!     async fn put(&self, data: Bytes) -> Result<ContentAddress> {
//!         todo!()
//!     }
//!
//!     async fn get(&self, address: &ContentAddress) -> Result<Bytes> {
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;
pub mod object_store;
pub mod playback;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use object_store::{ContentAddress, ObjectStore};
pub use playback::{
    AudioCodec, AudioFormat, PlayerEvent, PlayerEventReceiver, PlayerEventSender, PlayerFactory,
    PlayerHandle, TagReader, TrackMetadata,
};
pub use logging::{LogEntry, LogLevel, LoggerSink};
