use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("no term source produced any terms")]
    MissingCatalog,

    #[error("malformed document {path:?}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path:?}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid term index {path:?}: {source}")]
    Index {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        LinkError::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_display_names_path() {
        let e = LinkError::malformed("cases/a.md", "invalid UTF-8");
        let msg = e.to_string();
        assert!(msg.contains("cases/a.md"));
        assert!(msg.contains("invalid UTF-8"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e: LinkError = io_err.into();
        assert!(e.to_string().starts_with("io error"));
    }
}
