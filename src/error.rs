use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PreviewError>;

#[derive(Debug, Error)]
pub enum PreviewError {
    /// Network or HTTP failure, or a page without the expected table.
    #[error("source unavailable ({url}): {reason}")]
    SourceUnavailable { url: String, reason: String },

    #[error("snapshot not found: {}", path.display())]
    SnapshotMissing { path: PathBuf },

    /// Expected columns absent, header reconstruction failed, or a lookup came back empty.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot csv: {0}")]
    Csv(#[from] csv::Error),
}

impl PreviewError {
    pub fn source_unavailable(url: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }
}
