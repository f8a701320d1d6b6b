use crate::archive::ProjectArchive;
use crate::error::{Result, StoreError};
use crate::flatten::flatten_content;
use crate::paths::project_archive_path;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use storykit_protocol::{
    CodexEntry, CodexSource, Document, DocumentMeta, DocumentSource, SourceError,
};

/// Archive-backed source adapter.
///
/// One JSON archive per project under `projects/`. Reads load the archive
/// as committed on disk; the editing flows own the write side and commit
/// via `ProjectArchive::save` (atomic rename), so a reader never observes
/// a partial archive.
pub struct LocalProjectStore {
    data_root: PathBuf,
}

impl LocalProjectStore {
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    #[must_use]
    pub fn archive_path(&self, project_id: &str) -> PathBuf {
        project_archive_path(&self.data_root, project_id)
    }

    pub async fn load_archive(&self, project_id: &str) -> Result<ProjectArchive> {
        let path = self.archive_path(project_id);
        if !path.exists() {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }
        ProjectArchive::load(&path).await
    }

    pub async fn save_archive(&self, archive: &ProjectArchive) -> Result<()> {
        let path = self.archive_path(archive.project_id());
        archive.save(&path).await
    }
}

#[async_trait]
impl DocumentSource for LocalProjectStore {
    async fn list_documents(&self, project_id: &str) -> std::result::Result<Vec<DocumentMeta>, SourceError> {
        let archive = self.load_archive(project_id).await?;
        Ok(archive
            .documents()
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
    ) -> std::result::Result<Document, SourceError> {
        let archive = self.load_archive(project_id).await?;
        let stored = archive
            .document(document_id)
            .ok_or_else(|| SourceError::DocumentNotFound(document_id.to_string()))?;
        let text = flatten_content(&stored.content).map_err(|err| {
            SourceError::MalformedContent {
                document_id: document_id.to_string(),
                reason: err.to_string(),
            }
        })?;
        Ok(Document {
            id: stored.id.clone(),
            project_id: project_id.to_string(),
            kind: stored.kind,
            text,
        })
    }
}

#[async_trait]
impl CodexSource for LocalProjectStore {
    async fn codex_entries(&self, project_id: &str) -> std::result::Result<Vec<CodexEntry>, SourceError> {
        let archive = self.load_archive(project_id).await?;
        Ok(archive.codex_entries().clone())
    }
}
