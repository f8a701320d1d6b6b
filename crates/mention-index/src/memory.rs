//! In-memory document/codex source.
//!
//! Used by integration tests and by hosts that keep a project open in
//! memory (the desktop shell edits live documents and only periodically
//! commits the archive).

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use storykit_protocol::{
    CodexEntry, CodexSource, Document, DocumentMeta, DocumentSource, SourceError,
};

#[derive(Default)]
struct ProjectData {
    entries: Vec<CodexEntry>,
    documents: BTreeMap<String, Document>,
}

#[derive(Default)]
pub struct InMemoryProjectSource {
    inner: RwLock<HashMap<String, ProjectData>>,
}

impl InMemoryProjectSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_project(&self, project_id: impl Into<String>) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entry(project_id.into()).or_default();
    }

    /// Replace the project's codex entries, preserving the given order as
    /// registration order.
    pub fn set_codex_entries(&self, project_id: &str, entries: Vec<CodexEntry>) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner.entry(project_id.to_string()).or_default().entries = entries;
    }

    pub fn upsert_document(&self, document: Document) {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .entry(document.project_id.clone())
            .or_default()
            .documents
            .insert(document.id.clone(), document);
    }

    pub fn remove_document(&self, project_id: &str, document_id: &str) -> bool {
        let mut inner = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        inner
            .get_mut(project_id)
            .is_some_and(|data| data.documents.remove(document_id).is_some())
    }
}

#[async_trait]
impl DocumentSource for InMemoryProjectSource {
    async fn list_documents(&self, project_id: &str) -> Result<Vec<DocumentMeta>, SourceError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let data = inner
            .get(project_id)
            .ok_or_else(|| SourceError::ProjectNotFound(project_id.to_string()))?;
        Ok(data
            .documents
            .values()
            .map(|doc| DocumentMeta {
                id: doc.id.clone(),
                kind: doc.kind,
            })
            .collect())
    }

    async fn load_document(
        &self,
        project_id: &str,
        document_id: &str,
    ) -> Result<Document, SourceError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let data = inner
            .get(project_id)
            .ok_or_else(|| SourceError::ProjectNotFound(project_id.to_string()))?;
        data.documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| SourceError::DocumentNotFound(document_id.to_string()))
    }
}

#[async_trait]
impl CodexSource for InMemoryProjectSource {
    async fn codex_entries(&self, project_id: &str) -> Result<Vec<CodexEntry>, SourceError> {
        let inner = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let data = inner
            .get(project_id)
            .ok_or_else(|| SourceError::ProjectNotFound(project_id.to_string()))?;
        Ok(data.entries.clone())
    }
}
