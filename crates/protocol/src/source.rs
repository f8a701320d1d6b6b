//! Contracts the mention index consumes: document enumeration/loading and
//! the codex alias vocabulary.

use crate::{CodexEntry, Document, DocumentMeta};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Malformed content in document {document_id}: {reason}")]
    MalformedContent { document_id: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Serves the textual content of a project's documents.
///
/// Enumeration is separate from loading: `load_document` is where rich
/// content gets flattened to plain text, so a single malformed document
/// surfaces as a per-document `MalformedContent` instead of failing the
/// whole enumeration.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn list_documents(&self, project_id: &str) -> Result<Vec<DocumentMeta>, SourceError>;

    async fn load_document(
        &self,
        project_id: &str,
        document_id: &str,
    ) -> Result<Document, SourceError>;
}

/// Serves the current committed codex entries for a project, in
/// registration order. Registration order is load-bearing: it breaks alias
/// match ties.
#[async_trait]
pub trait CodexSource: Send + Sync {
    async fn codex_entries(&self, project_id: &str) -> Result<Vec<CodexEntry>, SourceError>;
}
