//! Error type for the file-backed store.

use std::path::PathBuf;

use prefstore_kv_store::StoreError;

/// Failures opening or persisting a [`JsonFileStore`](crate::JsonFileStore).
#[derive(thiserror::Error, Debug)]
pub enum FileStoreError {
    /// The backing file could not be read or written.
    #[error("failed to {action} preferences file {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backing file exists but is not valid JSON.
    #[error("preferences file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The backing file is valid JSON but not a top-level object.
    #[error("preferences file {path} must hold a top-level JSON object")]
    NotAnObject { path: PathBuf },

    /// The backing file is valid JSON but not the expected entry layout.
    #[error("preferences file {path} holds a malformed entry under key '{key}'")]
    MalformedEntry { path: PathBuf, key: String },
}

impl From<FileStoreError> for StoreError {
    fn from(e: FileStoreError) -> Self {
        StoreError::Transport(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_file() {
        let e = FileStoreError::MalformedEntry {
            path: PathBuf::from("/tmp/prefs.json"),
            key: "volume".to_string(),
        };
        let msg = format!("{}", e);
        assert!(msg.contains("/tmp/prefs.json"));
        assert!(msg.contains("volume"));
    }

    #[test]
    fn converts_into_store_error() {
        let e = FileStoreError::MalformedEntry {
            path: PathBuf::from("p.json"),
            key: "k".to_string(),
        };
        let store_err: StoreError = e.into();
        assert!(matches!(store_err, StoreError::Transport(_)));
    }
}
