//! Error type for the key-value layer.
//!
//! Errors at this level are transport-focused. No semantic errors like
//! "kind mismatch" or "unknown field" - those belong to the binding layer.

/// Errors from a key-value collaborator.
///
/// These are transport and system-level failures only. Semantic errors
/// (kind mismatches, unset fields, transform failures) are raised by the
/// binding layer above.
#[derive(Debug)]
pub enum StoreError {
    /// Generic I/O or transport failure.
    ///
    /// Use this for file I/O errors, IPC failures, backend errors, etc.
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The operation is not supported by this store.
    ///
    /// For example, clearing a read-only store.
    NotSupported,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Transport(e) => write!(f, "transport error: {}", e),
            StoreError::NotSupported => write!(f, "operation not supported"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Transport(e) => Some(e.as_ref()),
            StoreError::NotSupported => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Transport(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_works() {
        let e = StoreError::NotSupported;
        assert_eq!(format!("{}", e), "operation not supported");
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let e: StoreError = io_err.into();
        assert!(matches!(e, StoreError::Transport(_)));
        assert!(format!("{}", e).contains("file not found"));
    }

    #[test]
    fn transport_has_source() {
        use std::error::Error as StdError;
        let e: StoreError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(StdError::source(&e).is_some());
    }
}
