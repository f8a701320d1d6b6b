use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use storykit_protocol::{CodexEntry, DocumentKind};

pub const PROJECT_ARCHIVE_SCHEMA_VERSION: u32 = 1;

/// A document as authored: rich content, flattened only when served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub kind: DocumentKind,
    pub content: serde_json::Value,
}

/// Everything a project persists locally: codex entries in registration
/// order and documents keyed by id.
#[derive(Debug, Clone, Default)]
pub struct ProjectArchive {
    project_id: String,
    codex_entries: Vec<CodexEntry>,
    documents: BTreeMap<String, StoredDocument>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedProjectArchive {
    schema_version: u32,
    project_id: String,
    codex_entries: Vec<CodexEntry>,
    documents: BTreeMap<String, StoredDocument>,
}

impl ProjectArchive {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            codex_entries: Vec::new(),
            documents: BTreeMap::new(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let persisted: PersistedProjectArchive = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != PROJECT_ARCHIVE_SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found: persisted.schema_version,
                expected: PROJECT_ARCHIVE_SCHEMA_VERSION,
            });
        }
        Ok(Self {
            project_id: persisted.project_id,
            codex_entries: persisted.codex_entries,
            documents: persisted.documents,
        })
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedProjectArchive {
            schema_version: PROJECT_ARCHIVE_SCHEMA_VERSION,
            project_id: self.project_id.clone(),
            codex_entries: self.codex_entries.clone(),
            documents: self.documents.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&persisted)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    #[must_use]
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    #[must_use]
    pub const fn codex_entries(&self) -> &Vec<CodexEntry> {
        &self.codex_entries
    }

    #[must_use]
    pub const fn documents(&self) -> &BTreeMap<String, StoredDocument> {
        &self.documents
    }

    /// Insert or replace a codex entry, keeping registration order stable
    /// for existing entries.
    pub fn upsert_codex_entry(&mut self, entry: CodexEntry) {
        match self.codex_entries.iter_mut().find(|e| e.id == entry.id) {
            Some(slot) => *slot = entry,
            None => self.codex_entries.push(entry),
        }
    }

    pub fn remove_codex_entry(&mut self, entry_id: &str) -> bool {
        let before = self.codex_entries.len();
        self.codex_entries.retain(|e| e.id != entry_id);
        self.codex_entries.len() != before
    }

    pub fn upsert_document(&mut self, document: StoredDocument) {
        self.documents.insert(document.id.clone(), document);
    }

    pub fn remove_document(&mut self, document_id: &str) -> bool {
        self.documents.remove(document_id).is_some()
    }

    #[must_use]
    pub fn document(&self, document_id: &str) -> Option<&StoredDocument> {
        self.documents.get(document_id)
    }
}
