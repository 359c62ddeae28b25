use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is out of range or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
