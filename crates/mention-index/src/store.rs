use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use storykit_protocol::{DocumentKind, Mention};

pub const MENTION_STORE_SCHEMA_VERSION: u32 = 1;

/// One document's contribution to the index: the mentions found in it and
/// the fingerprint of the text they were derived from. Replaced wholesale
/// whenever the document is rescanned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMentions {
    pub kind: DocumentKind,
    pub fingerprint: u64,
    pub mentions: Vec<Mention>,
}

/// The per-project mention index as persisted.
///
/// Keyed by source document id; the by-entry view is derived on read by
/// walking documents in ascending id order (the defined document scan
/// order) with each slot's mentions in ascending offset order.
#[derive(Debug, Clone, Default)]
pub struct MentionStore {
    project_id: String,
    alias_fingerprint: u64,
    documents: BTreeMap<String, DocumentMentions>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedMentionStore {
    schema_version: u32,
    project_id: String,
    #[serde(default)]
    alias_fingerprint: u64,
    documents: BTreeMap<String, DocumentMentions>,
}

impl MentionStore {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            alias_fingerprint: 0,
            documents: BTreeMap::new(),
        }
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let persisted: PersistedMentionStore = serde_json::from_slice(&bytes)?;
        if persisted.schema_version != MENTION_STORE_SCHEMA_VERSION {
            return Err(IndexError::SchemaVersion {
                found: persisted.schema_version,
                expected: MENTION_STORE_SCHEMA_VERSION,
            });
        }
        Ok(Self {
            project_id: persisted.project_id,
            alias_fingerprint: persisted.alias_fingerprint,
            documents: persisted.documents,
        })
    }

    /// Persist with tmp-file + atomic rename so readers observe either the
    /// previous store or this one, never a partial write.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let persisted = PersistedMentionStore {
            schema_version: MENTION_STORE_SCHEMA_VERSION,
            project_id: self.project_id.clone(),
            alias_fingerprint: self.alias_fingerprint,
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

    /// Fingerprint of the alias table the stored scans were derived from.
    #[must_use]
    pub const fn alias_fingerprint(&self) -> u64 {
        self.alias_fingerprint
    }

    pub fn set_alias_fingerprint(&mut self, fingerprint: u64) {
        self.alias_fingerprint = fingerprint;
    }

    /// Replace every mention attributed to a document in one step.
    pub fn replace_document(
        &mut self,
        document_id: impl Into<String>,
        kind: DocumentKind,
        fingerprint: u64,
        mut mentions: Vec<Mention>,
    ) {
        mentions.sort_by_key(|m| m.start);
        self.documents.insert(
            document_id.into(),
            DocumentMentions {
                kind,
                fingerprint,
                mentions,
            },
        );
    }

    pub fn remove_document(&mut self, document_id: &str) -> bool {
        self.documents.remove(document_id).is_some()
    }

    /// Drop slots for documents that no longer exist. Returns how many were
    /// removed.
    pub fn purge_missing_documents(&mut self, live_documents: &HashSet<String>) -> usize {
        let before = self.documents.len();
        self.documents.retain(|id, _| live_documents.contains(id));
        before.saturating_sub(self.documents.len())
    }

    /// Drop every mention targeting a codex entry (entry deletion case).
    /// Returns how many mentions were removed.
    pub fn remove_entry_mentions(&mut self, codex_entry_id: &str) -> usize {
        let mut removed = 0;
        for slot in self.documents.values_mut() {
            let before = slot.mentions.len();
            slot.mentions.retain(|m| m.codex_entry_id != codex_entry_id);
            removed += before - slot.mentions.len();
        }
        removed
    }

    #[must_use]
    pub fn fingerprint(&self, document_id: &str) -> Option<u64> {
        self.documents.get(document_id).map(|d| d.fingerprint)
    }

    #[must_use]
    pub fn by_codex_entry(&self, codex_entry_id: &str) -> Vec<Mention> {
        self.documents
            .values()
            .flat_map(|slot| slot.mentions.iter())
            .filter(|m| m.codex_entry_id == codex_entry_id)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn all_by_entry(&self) -> BTreeMap<String, Vec<Mention>> {
        let mut out: BTreeMap<String, Vec<Mention>> = BTreeMap::new();
        for slot in self.documents.values() {
            for mention in &slot.mentions {
                out.entry(mention.codex_entry_id.clone())
                    .or_default()
                    .push(mention.clone());
            }
        }
        out
    }

    #[must_use]
    pub fn mention_count(&self) -> usize {
        self.documents.values().map(|d| d.mentions.len()).sum()
    }

    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub const fn documents(&self) -> &BTreeMap<String, DocumentMentions> {
        &self.documents
    }
}

/// Stable 64-bit fingerprint of a document's flattened text, used to skip
/// rescans of unchanged documents during sync.
#[must_use]
pub fn text_fingerprint(text: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn mention(entry: &str, doc: &str, start: usize) -> Mention {
        Mention {
            project_id: "p1".to_string(),
            codex_entry_id: entry.to_string(),
            source_document_id: doc.to_string(),
            source_document_kind: DocumentKind::Scene,
            start,
            end: start + 3,
            matched_text: "Ann".to_string(),
        }
    }

    #[tokio::test]
    async fn store_roundtrip_and_schema_check() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("mentions.json");

        let mut store = MentionStore::new("p1");
        store.replace_document(
            "s1",
            DocumentKind::Scene,
            7,
            vec![mention("e1", "s1", 4), mention("e1", "s1", 0)],
        );
        store.save(&path).await.unwrap();

        let loaded = MentionStore::load(&path).await.unwrap();
        assert_eq!(loaded.project_id(), "p1");
        assert_eq!(loaded.mention_count(), 2);
        // Offset order is restored regardless of insertion order.
        let starts: Vec<usize> = loaded
            .by_codex_entry("e1")
            .iter()
            .map(|m| m.start)
            .collect();
        assert_eq!(starts, vec![0, 4]);

        let bad = serde_json::json!({
            "schema_version": 9,
            "project_id": "p1",
            "documents": {}
        });
        tokio::fs::write(&path, bad.to_string()).await.unwrap();
        assert!(matches!(
            MentionStore::load(&path).await,
            Err(IndexError::SchemaVersion { found: 9, .. })
        ));
    }

    #[test]
    fn by_entry_walks_documents_in_id_order() {
        let mut store = MentionStore::new("p1");
        store.replace_document("b", DocumentKind::Scene, 1, vec![mention("e1", "b", 0)]);
        store.replace_document("a", DocumentKind::Snippet, 2, vec![mention("e1", "a", 5)]);

        let mentions = store.by_codex_entry("e1");
        let docs: Vec<&str> = mentions
            .iter()
            .map(|m| m.source_document_id.as_str())
            .collect();
        assert_eq!(docs, vec!["a", "b"]);
    }

    #[test]
    fn purge_drops_only_missing_documents() {
        let mut store = MentionStore::new("p1");
        store.replace_document("a", DocumentKind::Scene, 1, vec![mention("e1", "a", 0)]);
        store.replace_document("b", DocumentKind::Scene, 1, vec![mention("e1", "b", 0)]);

        let live: HashSet<String> = ["a".to_string()].into_iter().collect();
        assert_eq!(store.purge_missing_documents(&live), 1);
        assert_eq!(store.document_count(), 1);
        assert!(store.fingerprint("a").is_some());
    }

    #[test]
    fn remove_entry_mentions_leaves_other_entries_alone() {
        let mut store = MentionStore::new("p1");
        store.replace_document(
            "a",
            DocumentKind::Scene,
            1,
            vec![mention("e1", "a", 0), mention("e2", "a", 10)],
        );

        assert_eq!(store.remove_entry_mentions("e1"), 1);
        assert!(store.by_codex_entry("e1").is_empty());
        assert_eq!(store.by_codex_entry("e2").len(), 1);
    }

    #[test]
    fn fingerprints_differ_for_different_text() {
        assert_ne!(text_fingerprint("Ann waited."), text_fingerprint("Ann left."));
        assert_eq!(text_fingerprint("same"), text_fingerprint("same"));
    }
}
