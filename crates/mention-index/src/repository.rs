use crate::error::Result;
use crate::index::MentionIndexer;
use crate::report::RebuildReport;
use crate::state::IndexState;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use storykit_protocol::{CodexSource, Document, DocumentSource, Mention};

/// The externally consumed mention contract.
///
/// Reads answer from the current committed snapshot and return empty for
/// unknown projects or entries; they never fail on staleness. Each call
/// loads one committed snapshot, so a count and a list taken from the same
/// call site cannot diverge mid-rebuild.
#[async_trait]
pub trait MentionRepository: Send + Sync {
    /// Mentions of one entry, in document scan order then offset order.
    async fn get_by_codex_entry(
        &self,
        project_id: &str,
        codex_entry_id: &str,
    ) -> Result<Vec<Mention>>;

    async fn count_by_codex_entry(&self, project_id: &str, codex_entry_id: &str) -> Result<usize>;

    /// Full mapping for a project. Only entries with at least one mention
    /// appear; callers wanting zero rows diff against the codex entry list.
    async fn get_all_by_project(&self, project_id: &str) -> Result<BTreeMap<String, Vec<Mention>>>;

    /// Returns only after the rebuild (or the coalesced rebuild it waited
    /// on) completes.
    async fn rebuild_index(&self, project_id: &str) -> Result<RebuildReport>;
}

/// Repository over the local on-disk index, plus the incremental operations
/// the editing flows call.
pub struct LocalMentionRepository {
    indexer: MentionIndexer,
}

impl LocalMentionRepository {
    #[must_use]
    pub fn new(
        data_root: impl Into<PathBuf>,
        documents: Arc<dyn DocumentSource>,
        codex: Arc<dyn CodexSource>,
    ) -> Self {
        Self {
            indexer: MentionIndexer::new(data_root, documents, codex),
        }
    }

    pub async fn apply_document(&self, document: &Document) -> Result<usize> {
        self.indexer.apply_document(document).await
    }

    pub async fn remove_document(&self, project_id: &str, document_id: &str) -> Result<bool> {
        self.indexer.remove_document(project_id, document_id).await
    }

    pub async fn remove_codex_entry(
        &self,
        project_id: &str,
        codex_entry_id: &str,
    ) -> Result<usize> {
        self.indexer
            .remove_codex_entry(project_id, codex_entry_id)
            .await
    }

    pub async fn sync(&self, project_id: &str) -> Result<RebuildReport> {
        self.indexer.sync(project_id).await
    }

    pub async fn mark_stale(&self, project_id: &str) -> Result<()> {
        self.indexer.mark_stale(project_id).await
    }

    pub async fn freshness(&self, project_id: &str) -> Result<IndexState> {
        self.indexer.freshness(project_id).await
    }

    #[must_use]
    pub const fn indexer(&self) -> &MentionIndexer {
        &self.indexer
    }
}

#[async_trait]
impl MentionRepository for LocalMentionRepository {
    async fn get_by_codex_entry(
        &self,
        project_id: &str,
        codex_entry_id: &str,
    ) -> Result<Vec<Mention>> {
        let snapshot = self.indexer.snapshot(project_id).await?;
        Ok(snapshot.by_codex_entry(codex_entry_id))
    }

    async fn count_by_codex_entry(&self, project_id: &str, codex_entry_id: &str) -> Result<usize> {
        let snapshot = self.indexer.snapshot(project_id).await?;
        Ok(snapshot.by_codex_entry(codex_entry_id).len())
    }

    async fn get_all_by_project(&self, project_id: &str) -> Result<BTreeMap<String, Vec<Mention>>> {
        let snapshot = self.indexer.snapshot(project_id).await?;
        Ok(snapshot.all_by_entry())
    }

    async fn rebuild_index(&self, project_id: &str) -> Result<RebuildReport> {
        self.indexer.rebuild(project_id).await
    }
}
