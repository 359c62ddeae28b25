//! # Catalog
//!
//! Ordered, append-only collection of [`SongRecord`]s indexed by content
//! hash. The first record seen for a hash wins; later records with the same
//! hash are ignored even if their locator or metadata differ. Nothing is
//! ever removed, so positions are stable and a [`SearchPager`] can keep a
//! plain index into the catalog.
//!
//! [`SearchPager`]: crate::search::SearchPager

use crate::models::SongRecord;
use core_storage::ContentHash;
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Default, Clone)]
pub struct Catalog {
    records: Vec<SongRecord>,
    by_hash: HashMap<ContentHash, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` unless a song with the same hash is already present.
    ///
    /// Returns whether the record was inserted.
    pub fn load_song(&mut self, record: SongRecord) -> bool {
        if self.by_hash.contains_key(&record.content_hash) {
            trace!(hash = %record.content_hash, "Song already in catalog");
            return false;
        }

        self.by_hash
            .insert(record.content_hash.clone(), self.records.len());
        self.records.push(record);
        true
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&SongRecord> {
        self.by_hash.get(hash).map(|&index| &self.records[index])
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.by_hash.contains_key(hash)
    }

    /// Record at catalog position `index`.
    pub fn at(&self, index: usize) -> Option<&SongRecord> {
        self.records.get(index)
    }

    /// Ordered copy of every record.
    pub fn snapshot(&self) -> Vec<SongRecord> {
        self.records.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SongRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_storage::{codec, Locator};

    fn song(title: &str, audio: &[u8], address: &str) -> SongRecord {
        SongRecord::new(
            title,
            "Artist",
            "Album",
            codec::hash(audio),
            Locator::parse(&format!("plain:{}", address)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_load_song_is_idempotent_and_first_writer_wins() {
        let mut catalog = Catalog::new();

        assert!(catalog.load_song(song("Original", b"audio", "addr-1")));
        assert!(!catalog.load_song(song("Retitled", b"audio", "addr-2")));

        assert_eq!(catalog.len(), 1);
        let stored = catalog.get(&codec::hash(b"audio")).unwrap();
        assert_eq!(stored.title, "Original");
        assert_eq!(stored.locator.to_string(), "plain:addr-1");
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut catalog = Catalog::new();
        for (i, title) in ["c", "a", "b"].iter().enumerate() {
            catalog.load_song(song(title, &[i as u8], "addr"));
        }

        let titles: Vec<_> = catalog.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["c", "a", "b"]);
        assert_eq!(catalog.at(1).unwrap().title, "a");
        assert_eq!(catalog.snapshot().len(), 3);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::new();
        assert!(catalog.is_empty());
        assert!(catalog.get(&codec::hash(b"nothing")).is_none());
        assert!(catalog.at(0).is_none());
    }
}
