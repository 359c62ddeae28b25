use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Invalid input: {field} - {message}")]
    InvalidInput { field: String, message: String },

    /// The snapshot as a whole could not be read or written.
    #[error("Malformed catalog snapshot: {0}")]
    Snapshot(String),
}

impl LibraryError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        LibraryError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
