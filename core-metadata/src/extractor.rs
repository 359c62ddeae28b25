//! Audio Tag Extraction
//!
//! Extracts the tags the catalog needs from an in-memory audio buffer using
//! the `lofty` crate. It supports ID3v2, Vorbis Comments, MP4 tags, FLAC and
//! RIFF INFO.
//!
//! ## Overview
//!
//! - Reads title, artist and album from the primary tag, falling back to the
//!   first tag present
//! - Normalizes text (trim, collapse whitespace, drop control characters)
//! - Reports container properties for logging
//! - Never guesses a title: a file without one yields `title: None` and the
//!   caller decides what to do
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::playback::TagReader;
//! use core_metadata::LoftyTagReader;
//!
//! let reader = LoftyTagReader::new();
//! let metadata = reader.read_metadata(bytes).await?;
//! println!("Title: {}", metadata.title.unwrap_or_default());
//! ```

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult,
    playback::{AudioCodec, TagReader, TrackMetadata},
};
use bytes::Bytes;
use lofty::config::ParseOptions;
use lofty::error::ErrorKind;
use lofty::file::{AudioFile, FileType, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::io::Cursor;
use tracing::{debug, warn};

use crate::error::{MetadataError, Result};

/// Tags and container properties read from one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTags {
    pub metadata: TrackMetadata,
    /// Codec guessed from the container type
    pub codec: AudioCodec,
    /// Duration in milliseconds
    pub duration_ms: u64,
    pub sample_rate: Option<u32>,
    pub channels: Option<u8>,
}

/// `lofty`-backed [`TagReader`].
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    /// Create a reader with custom parse options
    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }

    /// Parse `data` synchronously.
    ///
    /// # Errors
    ///
    /// - [`MetadataError::UnsupportedFormat`] if the container is not
    ///   recognized
    /// - [`MetadataError::CorruptedFile`] if it is recognized but unreadable
    pub fn extract(&self, data: &[u8]) -> Result<ExtractedTags> {
        let tagged_file = Probe::new(Cursor::new(data))
            .options(self.parse_options)
            .guess_file_type()
            .map_err(|e| MetadataError::ExtractionFailed(format!("Failed to probe buffer: {}", e)))?
            .read()
            .map_err(|e| match e.kind() {
                ErrorKind::UnknownFormat => MetadataError::UnsupportedFormat(e.to_string()),
                _ => MetadataError::CorruptedFile(e.to_string()),
            })?;

        let file_type = tagged_file.file_type();
        let properties = tagged_file.properties();

        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());

        let metadata = match tag {
            Some(tag) => TrackMetadata {
                title: tag.title().map(|s| normalize_text(&s)).filter(|s| !s.is_empty()),
                artist: tag.artist().map(|s| normalize_text(&s)).filter(|s| !s.is_empty()),
                album: tag.album().map(|s| normalize_text(&s)).filter(|s| !s.is_empty()),
            },
            None => {
                warn!(?file_type, "No tags found in audio buffer");
                TrackMetadata::default()
            }
        };

        Ok(ExtractedTags {
            metadata,
            codec: file_type_to_codec(file_type),
            duration_ms: properties.duration().as_millis() as u64,
            sample_rate: properties.sample_rate(),
            channels: properties.channels(),
        })
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TagReader for LoftyTagReader {
    async fn read_metadata(&self, data: Bytes) -> BridgeResult<TrackMetadata> {
        let reader = LoftyTagReader::with_options(self.parse_options);
        let size = data.len();

        let tags = tokio::task::spawn_blocking(move || reader.extract(&data))
            .await
            .map_err(|e| MetadataError::ExtractionFailed(e.to_string()))??;

        debug!(
            size,
            codec = ?tags.codec,
            duration_ms = tags.duration_ms,
            has_title = tags.metadata.title.is_some(),
            "Read audio tags"
        );
        Ok(tags.metadata)
    }
}

/// Normalize text metadata
///
/// - Trims leading/trailing whitespace
/// - Normalizes consecutive whitespace to single space
/// - Removes null bytes and control characters
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

fn file_type_to_codec(file_type: FileType) -> AudioCodec {
    match file_type {
        FileType::Aac => AudioCodec::Aac,
        FileType::Flac => AudioCodec::Flac,
        FileType::Mpeg => AudioCodec::Mp3,
        FileType::Opus => AudioCodec::Opus,
        FileType::Vorbis => AudioCodec::Vorbis,
        FileType::Wav => AudioCodec::Wav,
        FileType::Mp4 => AudioCodec::Other("mp4".to_string()),
        FileType::Aiff => AudioCodec::Other("aiff".to_string()),
        FileType::Ape => AudioCodec::Other("ape".to_string()),
        FileType::Mpc => AudioCodec::Other("musepack".to_string()),
        FileType::Speex => AudioCodec::Other("speex".to_string()),
        FileType::WavPack => AudioCodec::Other("wavpack".to_string()),
        _ => AudioCodec::Unknown,
    }
}
