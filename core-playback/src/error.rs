//! # Playback Error Types
//!
//! Error types for loading a track and handing it to a player.

use bridge_traits::error::BridgeError;
use core_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The locator points at nothing the store or network can produce.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The blob was found but could not be turned into audio bytes
    /// (bad locator, wrong key, tampered ciphertext).
    #[error("Failed to open audio source: {0}")]
    SourceError(String),

    /// Audio source is temporarily unavailable (timeout, transport failure).
    #[error("Audio source unavailable: {0}")]
    SourceUnavailable(String),

    // ========================================================================
    // Player Errors
    // ========================================================================
    /// The player factory rejected the buffer.
    #[error("Cannot decode audio: {0}")]
    DecodingError(String),

    /// The active player reported a failure.
    #[error("Playback operation failed: {0}")]
    PlaybackFailed(String),

    /// No player factory was configured.
    #[error("Playback adapter not initialized")]
    AdapterNotInitialized,
}

impl PlaybackError {
    /// Returns `true` if this error is transient and the operation can be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, PlaybackError::SourceUnavailable(_))
    }
}

impl From<StorageError> for PlaybackError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            PlaybackError::TrackNotFound(err.to_string())
        } else if err.is_transient() {
            PlaybackError::SourceUnavailable(err.to_string())
        } else {
            PlaybackError::SourceError(err.to_string())
        }
    }
}

impl From<BridgeError> for PlaybackError {
    fn from(err: BridgeError) -> Self {
        PlaybackError::DecodingError(err.to_string())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
