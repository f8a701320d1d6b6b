use crate::alias::AliasTable;
use crate::error::Result;
use crate::gate::GateRegistry;
use crate::lock::acquire_index_write_lock;
use crate::paths::{lock_path_for_project, mentions_path_for_project, state_path_for_project};
use crate::report::RebuildReport;
use crate::scanner::scan_document;
use crate::state::{read_index_state, unix_time_ms, write_index_state, IndexState};
use crate::store::{text_fingerprint, MentionStore};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use storykit_protocol::{CodexSource, Document, DocumentSource, Freshness};

/// Owns a project's mention index on disk and the operations that mutate it.
///
/// Mutations serialize per project: an in-process async mutex plus a
/// cross-process file lock. The committed artifacts (`mentions.json`,
/// `state.json`) are only ever replaced by atomic rename, so read paths
/// never lock and never observe a partial index.
pub struct MentionIndexer {
    data_root: PathBuf,
    documents: Arc<dyn DocumentSource>,
    codex: Arc<dyn CodexSource>,
    gates: GateRegistry,
}

impl MentionIndexer {
    #[must_use]
    pub fn new(
        data_root: impl Into<PathBuf>,
        documents: Arc<dyn DocumentSource>,
        codex: Arc<dyn CodexSource>,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            documents,
            codex,
            gates: GateRegistry::default(),
        }
    }

    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    #[must_use]
    pub fn mentions_path(&self, project_id: &str) -> PathBuf {
        mentions_path_for_project(&self.data_root, project_id)
    }

    #[must_use]
    pub fn state_path(&self, project_id: &str) -> PathBuf {
        state_path_for_project(&self.data_root, project_id)
    }

    /// The current committed store; an empty store when the project has
    /// never been indexed.
    pub async fn snapshot(&self, project_id: &str) -> Result<MentionStore> {
        let path = self.mentions_path(project_id);
        if !path.exists() {
            return Ok(MentionStore::new(project_id));
        }
        MentionStore::load(&path).await
    }

    /// Current freshness record; `Stale` when the project has no state yet.
    pub async fn freshness(&self, project_id: &str) -> Result<IndexState> {
        Ok(read_index_state(self.state_path(project_id))
            .await?
            .unwrap_or_else(|| IndexState::stale(project_id)))
    }

    /// Rescan one document and replace its contribution to the index.
    ///
    /// Freshness is left untouched: replacing a single document cannot make
    /// a stale index fresh, and does not invalidate a fresh one. Returns the
    /// number of mentions found.
    pub async fn apply_document(&self, document: &Document) -> Result<usize> {
        let gate = self.gates.gate(&document.project_id);
        let _write = gate.write.lock().await;
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, &document.project_id))
                .await?;

        let entries = self.codex.codex_entries(&document.project_id).await?;
        let table = AliasTable::compile(&entries)?;
        let mentions = scan_document(document, &table);
        let found = mentions.len();

        let mut store = self.snapshot(&document.project_id).await?;
        store.set_alias_fingerprint(table.fingerprint());
        store.replace_document(
            &document.id,
            document.kind,
            text_fingerprint(&document.text),
            mentions,
        );
        store.save(self.mentions_path(&document.project_id)).await?;

        log::debug!(
            "Applied document {} to mention index of {} ({found} mentions)",
            document.id,
            document.project_id
        );
        Ok(found)
    }

    /// Remove every mention attributed to a document (deletion case).
    pub async fn remove_document(&self, project_id: &str, document_id: &str) -> Result<bool> {
        let gate = self.gates.gate(project_id);
        let _write = gate.write.lock().await;
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, project_id)).await?;

        let mut store = self.snapshot(project_id).await?;
        let removed = store.remove_document(document_id);
        if removed {
            store.save(self.mentions_path(project_id)).await?;
            log::debug!("Removed document {document_id} from mention index of {project_id}");
        }
        Ok(removed)
    }

    /// Remove every mention targeting a deleted codex entry. Returns the
    /// number of mentions removed.
    pub async fn remove_codex_entry(&self, project_id: &str, codex_entry_id: &str) -> Result<usize> {
        let gate = self.gates.gate(project_id);
        let _write = gate.write.lock().await;
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, project_id)).await?;

        let mut store = self.snapshot(project_id).await?;
        let removed = store.remove_entry_mentions(codex_entry_id);
        if removed > 0 {
            store.save(self.mentions_path(project_id)).await?;
            log::debug!(
                "Removed {removed} mentions of deleted entry {codex_entry_id} from {project_id}"
            );
        }
        Ok(removed)
    }

    /// Alias-table-wide change hook: persist `Stale` so callers know a
    /// rebuild is owed. The committed mention data stays readable.
    pub async fn mark_stale(&self, project_id: &str) -> Result<()> {
        let gate = self.gates.gate(project_id);
        let _write = gate.write.lock().await;
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, project_id)).await?;

        let mut state = self.freshness(project_id).await?;
        state.freshness = Freshness::Stale;
        write_index_state(self.state_path(project_id), &state).await
    }

    /// Full rebuild from every current document and the current alias table.
    ///
    /// Only one rebuild runs per project at any time. A call that finds a
    /// rebuild completed while it waited returns that rebuild's report with
    /// `coalesced = true` instead of running again.
    pub async fn rebuild(&self, project_id: &str) -> Result<RebuildReport> {
        let gate = self.gates.gate(project_id);
        let observed = gate.completed_rebuilds();
        let _write = gate.write.lock().await;

        if gate.completed_rebuilds() > observed {
            if let Some(mut report) = gate.last_report() {
                report.coalesced = true;
                log::info!("Coalesced mention index rebuild for project {project_id}");
                return Ok(report);
            }
        }

        let report = self.rebuild_locked(project_id).await?;
        gate.record_rebuild(&report);
        Ok(report)
    }

    async fn rebuild_locked(&self, project_id: &str) -> Result<RebuildReport> {
        let started = Instant::now();
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, project_id)).await?;

        log::info!("Rebuilding mention index for project {project_id}");

        let mut state = self.freshness(project_id).await?;
        state.freshness = Freshness::Rebuilding;
        write_index_state(self.state_path(project_id), &state).await?;

        let result = self.rebuild_inner(project_id).await;
        match result {
            Ok(mut report) => {
                state.freshness = Freshness::Fresh;
                state.built_at_unix_ms = Some(unix_time_ms());
                state.last_errors = report.errors.clone();
                write_index_state(self.state_path(project_id), &state).await?;

                #[allow(clippy::cast_possible_truncation)]
                {
                    report.time_ms = (started.elapsed().as_millis() as u64).max(1);
                }
                log::info!(
                    "Mention index rebuilt for {project_id}: {} documents, {} mentions, {} skipped",
                    report.documents,
                    report.mentions,
                    report.skipped
                );
                Ok(report)
            }
            Err(err) => {
                // The committed store is untouched on failure; record that a
                // rebuild is still owed.
                state.freshness = Freshness::Stale;
                let _ = write_index_state(self.state_path(project_id), &state).await;
                Err(err)
            }
        }
    }

    async fn rebuild_inner(&self, project_id: &str) -> Result<RebuildReport> {
        let entries = self.codex.codex_entries(project_id).await?;
        let table = AliasTable::compile(&entries)?;

        let mut report = RebuildReport::new(project_id);
        report.entries = table.entry_count();
        report.aliases = table.pattern_count();

        let metas = self.documents.list_documents(project_id).await?;

        // Stage into a fresh store; the save below is the atomic swap, so
        // readers see the fully-old or fully-new index, never a partial one.
        let mut fresh = MentionStore::new(project_id);
        fresh.set_alias_fingerprint(table.fingerprint());

        for meta in metas {
            match self.documents.load_document(project_id, &meta.id).await {
                Ok(doc) => {
                    let mentions = scan_document(&doc, &table);
                    report.add_document(mentions.len());
                    fresh.replace_document(
                        &doc.id,
                        doc.kind,
                        text_fingerprint(&doc.text),
                        mentions,
                    );
                }
                Err(err) => {
                    log::warn!("Skipping document {} during rebuild: {err}", meta.id);
                    report.add_skipped(format!("{}: {err}", meta.id));
                }
            }
        }

        fresh.save(self.mentions_path(project_id)).await?;
        report.mentions = fresh.mention_count();
        Ok(report)
    }

    /// Incremental reconciliation: rescan only documents whose text changed,
    /// drop documents that no longer exist. Converges to the same store a
    /// rebuild would produce; a changed alias table forces every document to
    /// rescan. Freshness is left untouched.
    pub async fn sync(&self, project_id: &str) -> Result<RebuildReport> {
        let started = Instant::now();
        let gate = self.gates.gate(project_id);
        let _write = gate.write.lock().await;
        let _lock =
            acquire_index_write_lock(lock_path_for_project(&self.data_root, project_id)).await?;

        let entries = self.codex.codex_entries(project_id).await?;
        let table = AliasTable::compile(&entries)?;

        let mut report = RebuildReport::new(project_id);
        report.entries = table.entry_count();
        report.aliases = table.pattern_count();

        let metas = self.documents.list_documents(project_id).await?;
        let mut store = self.snapshot(project_id).await?;

        let vocabulary_changed = store.alias_fingerprint() != table.fingerprint();
        if vocabulary_changed {
            store.set_alias_fingerprint(table.fingerprint());
        }
        let mut dirty = vocabulary_changed;

        let live: HashSet<String> = metas.iter().map(|m| m.id.clone()).collect();
        let purged = store.purge_missing_documents(&live);
        if purged > 0 {
            log::info!("Purged {purged} deleted documents from mention index of {project_id}");
            dirty = true;
        }

        for meta in metas {
            match self.documents.load_document(project_id, &meta.id).await {
                Ok(doc) => {
                    let fingerprint = text_fingerprint(&doc.text);
                    if !vocabulary_changed && store.fingerprint(&doc.id) == Some(fingerprint) {
                        continue;
                    }
                    let mentions = scan_document(&doc, &table);
                    report.add_document(mentions.len());
                    store.replace_document(&doc.id, doc.kind, fingerprint, mentions);
                    dirty = true;
                }
                Err(err) => {
                    log::warn!("Skipping document {} during sync: {err}", meta.id);
                    report.add_skipped(format!("{}: {err}", meta.id));
                    // The stored scan no longer reflects servable content.
                    if store.remove_document(&meta.id) {
                        dirty = true;
                    }
                }
            }
        }

        if dirty {
            store.save(self.mentions_path(project_id)).await?;
        }
        report.mentions = store.mention_count();

        #[allow(clippy::cast_possible_truncation)]
        {
            report.time_ms = (started.elapsed().as_millis() as u64).max(1);
        }
        log::debug!(
            "Synced mention index for {project_id}: {} rescanned, {} skipped, {} mentions",
            report.documents,
            report.skipped,
            report.mentions
        );
        Ok(report)
    }
}
