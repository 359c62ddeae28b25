//! # Metadata Module
//!
//! Reads title, artist and album tags out of in-memory audio buffers.
//!
//! ## Overview
//!
//! This module handles:
//! - Audio tag extraction (ID3, Vorbis, MP4, FLAC, RIFF INFO) via `lofty`
//! - Text normalization of tag values
//! - The [`TagReader`](bridge_traits::playback::TagReader) implementation
//!   used by the ingestion pipeline

pub mod error;
pub mod extractor;

pub use error::{MetadataError, Result};
pub use extractor::{ExtractedTags, LoftyTagReader};
