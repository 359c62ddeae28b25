//! # Library Management Module
//!
//! Owns the in-memory song catalog and the ways of reading it.
//!
//! ## Overview
//!
//! This module manages:
//! - [`SongRecord`], the catalog's unit, keyed by plaintext content hash
//! - [`Catalog`], an append-only, deduplicating, ordered collection
//! - [`SearchPager`], resumable substring search over the catalog
//! - [`snapshot`], the JSON form used for export and import

pub mod catalog;
pub mod error;
pub mod models;
pub mod search;
pub mod snapshot;

pub use catalog::Catalog;
pub use error::{LibraryError, Result};
pub use models::SongRecord;
pub use search::SearchPager;
pub use snapshot::DecodedSnapshot;
