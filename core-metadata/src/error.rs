use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to extract metadata: {0}")]
    ExtractionFailed(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupted file: {0}")]
    CorruptedFile(String),
}

impl From<MetadataError> for BridgeError {
    fn from(err: MetadataError) -> Self {
        BridgeError::OperationFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MetadataError>;
