//! # Storage Error Types

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// Errors raised while moving blobs through a locator.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The locator scheme is not one the resolver can serve.
    #[error("Unsupported locator scheme: {0}")]
    UnsupportedScheme(String),

    /// The locator string could not be parsed.
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    /// The blob is unreachable in the store or over the network.
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The key in a locator fragment is malformed.
    #[error("Failed to import key: {0}")]
    KeyImport(String),

    /// Encryption failed before the blob was written.
    #[error("Encryption failed: {0}")]
    Encrypt(String),

    /// Ciphertext was truncated or failed authentication.
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    /// A content hash string was not 64 lowercase hex digits.
    #[error("Invalid content hash: {0}")]
    InvalidHash(String),

    /// Retrieval did not finish within the configured bound.
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// A blocking crypto task was cancelled or panicked.
    #[error("Crypto task failed: {0}")]
    Task(String),

    /// Any other failure reported by a bridge adapter.
    #[error("Bridge error: {0}")]
    Bridge(BridgeError),
}

impl StorageError {
    /// Returns true if a later retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Timeout(_) => true,
            StorageError::Bridge(err) => err.is_transient(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

impl From<BridgeError> for StorageError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotFound(msg) => StorageError::NotFound(msg),
            BridgeError::Timeout(msg) => StorageError::Timeout(msg),
            BridgeError::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => {
                StorageError::NotFound(io.to_string())
            }
            other => StorageError::Bridge(other),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
