use storykit_protocol::SourceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Unsupported mention store schema_version {found} (expected {expected})")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("Alias pattern error: {0}")]
    AliasPattern(String),

    #[error("{0}")]
    Other(String),
}
