//! # Catalog Snapshots
//!
//! A snapshot is the catalog serialized as a JSON array of song records.
//! It is what gets written to the object store on export and read back on
//! import.
//!
//! Decoding is lenient per entry: a record that fails to parse or validate is
//! skipped and counted, so one bad entry does not cost the whole import. A
//! payload that is not a JSON array at all is an error.

use crate::error::{LibraryError, Result};
use crate::models::SongRecord;
use bytes::Bytes;
use serde_json::Value;
use tracing::warn;

/// Records recovered from a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub records: Vec<SongRecord>,
    /// Entries that were skipped as malformed
    pub rejected: usize,
}

/// Serialize records in catalog order.
pub fn encode(records: &[SongRecord]) -> Result<Bytes> {
    serde_json::to_vec(records)
        .map(Bytes::from)
        .map_err(|e| LibraryError::Snapshot(e.to_string()))
}

/// Parse a snapshot, skipping malformed entries.
pub fn decode(data: &[u8]) -> Result<DecodedSnapshot> {
    let entries: Vec<Value> =
        serde_json::from_slice(data).map_err(|e| LibraryError::Snapshot(e.to_string()))?;

    let mut decoded = DecodedSnapshot {
        records: Vec::with_capacity(entries.len()),
        rejected: 0,
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let record = serde_json::from_value::<SongRecord>(entry)
            .map_err(|e| e.to_string())
            .and_then(|record| record.validate().map(|_| record).map_err(|e| e.to_string()));

        match record {
            Ok(record) => decoded.records.push(record),
            Err(reason) => {
                warn!(index, %reason, "Skipping malformed snapshot entry");
                decoded.rejected += 1;
            }
        }
    }

    Ok(decoded)
}
