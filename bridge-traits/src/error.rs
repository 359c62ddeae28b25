use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Bridge operation timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns `true` when the collaborator reported that the requested item
    /// does not exist (as opposed to failing to look for it).
    pub fn is_not_found(&self) -> bool {
        match self {
            BridgeError::NotFound(_) => true,
            BridgeError::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns `true` if retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BridgeError::OperationFailed(_) | BridgeError::Timeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(BridgeError::NotFound("abc".into()).is_not_found());
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(BridgeError::Io(io).is_not_found());
        assert!(!BridgeError::OperationFailed("boom".into()).is_not_found());
    }

    #[test]
    fn test_transient_classification() {
        assert!(BridgeError::Timeout("get".into()).is_transient());
        assert!(BridgeError::OperationFailed("503".into()).is_transient());
        assert!(!BridgeError::NotFound("abc".into()).is_transient());
        assert!(!BridgeError::NotAvailable("http".into()).is_transient());
    }
}
