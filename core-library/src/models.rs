//! Domain models for the music library

use crate::error::{LibraryError, Result};
use core_runtime::events::SongSummary;
use core_storage::{ContentHash, Locator};
use serde::{Deserialize, Serialize};

/// One song in the catalog.
///
/// `content_hash` identifies the plaintext audio and is the catalog key.
/// Two records with the same hash are the same song even when their
/// locators differ.
///
/// Serialized with the field names `title`, `artist`, `album`,
/// `contentHash` and `locator`. Older snapshots that still call the locator
/// `url` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub album: String,
    pub content_hash: ContentHash,
    #[serde(alias = "url")]
    pub locator: Locator,
}

impl SongRecord {
    /// Create a validated record.
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
        content_hash: ContentHash,
        locator: Locator,
    ) -> Result<Self> {
        let record = Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
            content_hash,
            locator,
        };
        record.validate()?;
        Ok(record)
    }

    /// Validate fields that serde cannot check on its own.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LibraryError::invalid_input("title", "Song title cannot be empty"));
        }

        if !self.locator.is_stored() {
            return Err(LibraryError::invalid_input(
                "locator",
                format!("Songs must live in the object store, got a {} locator", self.locator.scheme()),
            ));
        }

        Ok(())
    }

    /// Case-insensitive substring match against title, artist or album.
    ///
    /// `needle` must already be lowercase (see [`SongRecord::normalize`]).
    pub fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.artist, &self.album]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }

    /// Normalize a string for searching
    pub fn normalize(s: &str) -> String {
        s.to_lowercase()
    }
}

impl From<&SongRecord> for SongSummary {
    fn from(record: &SongRecord) -> Self {
        SongSummary {
            title: record.title.clone(),
            artist: record.artist.clone(),
            album: record.album.clone(),
            content_hash: record.content_hash.to_string(),
            locator: record.locator.to_string(),
        }
    }
}
