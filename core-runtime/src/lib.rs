//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the library core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other `core-*` crate depends on this one for its logging
//! conventions, and the service façade uses the configuration builder and the
//! event bus to wire collaborators together and report results outward.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{BlobScheme, CoreConfig, CoreConfigBuilder};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream, LibraryEvent, PlaybackEvent, SongSummary};
