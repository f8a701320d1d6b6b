//! Shared data model and source contracts for the storykit mention subsystem.
//!
//! Everything that crosses a crate boundary lives here: the document and
//! codex-entry shapes the project store serves, the `Mention` record the
//! index produces, and the async source traits the index consumes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod source;

pub use source::{CodexSource, DocumentSource, SourceError};

/// Kind of project document a mention can originate from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Scene,
    CodexEntry,
    Snippet,
    ChatMessage,
}

impl DocumentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Scene => "scene",
            DocumentKind::CodexEntry => "codex_entry",
            DocumentKind::Snippet => "snippet",
            DocumentKind::ChatMessage => "chat_message",
        }
    }
}

/// Enumeration handle for a document; content is loaded (and flattened)
/// separately so one malformed document fails alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DocumentMeta {
    pub id: String,
    pub kind: DocumentKind,
}

/// A project document with its content already flattened to plain text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Document {
    pub id: String,
    pub project_id: String,
    pub kind: DocumentKind,
    pub text: String,
}

/// A codex entry: the named thing (character, place, lore item) mentions
/// resolve to.
///
/// The entry's descriptive document shares the entry's id (a document of
/// kind `codex_entry` with the same id), which is what makes self-mentions
/// detectable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CodexEntry {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl CodexEntry {
    /// Strings this entry matches under: canonical name first, then aliases
    /// in listed order. Empty and whitespace-only strings are skipped.
    pub fn match_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .filter(|s| !s.trim().is_empty())
    }
}

/// A located occurrence of a codex entry's name or alias inside a project
/// document.
///
/// `start`/`end` are character offsets into the flattened text. Identity is
/// `(source_document_id, codex_entry_id, start)`; mentions are never
/// mutated, only replaced wholesale when their source document is rescanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Mention {
    pub project_id: String,
    pub codex_entry_id: String,
    pub source_document_id: String,
    pub source_document_kind: DocumentKind,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
}

impl Mention {
    /// True when a codex entry's own document references the entry itself.
    #[must_use]
    pub fn is_self_mention(&self) -> bool {
        self.source_document_kind == DocumentKind::CodexEntry
            && self.source_document_id == self.codex_entry_id
    }
}

/// Index freshness per project: `Stale → Rebuilding → Fresh`.
///
/// Incremental updates never change freshness; `mark_stale` (alias-table
/// wide changes) and `rebuild` do. An index that never rebuilt is `Stale`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    #[default]
    Stale,
    Rebuilding,
    Fresh,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(name: &str, aliases: &[&str]) -> CodexEntry {
        CodexEntry {
            id: "e1".to_string(),
            project_id: "p1".to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn match_names_yields_name_then_aliases() {
        let e = entry("Anna Karenina", &["Anna", "Madame Karenina"]);
        let names: Vec<&str> = e.match_names().collect();
        assert_eq!(names, vec!["Anna Karenina", "Anna", "Madame Karenina"]);
    }

    #[test]
    fn match_names_skips_blank_strings() {
        let e = entry("Anna", &["", "   ", "Annie"]);
        let names: Vec<&str> = e.match_names().collect();
        assert_eq!(names, vec!["Anna", "Annie"]);
    }

    #[test]
    fn self_mention_requires_codex_kind_and_matching_ids() {
        let mut m = Mention {
            project_id: "p1".to_string(),
            codex_entry_id: "e1".to_string(),
            source_document_id: "e1".to_string(),
            source_document_kind: DocumentKind::CodexEntry,
            start: 0,
            end: 4,
            matched_text: "Anna".to_string(),
        };
        assert!(m.is_self_mention());

        m.source_document_kind = DocumentKind::Scene;
        assert!(!m.is_self_mention());

        m.source_document_kind = DocumentKind::CodexEntry;
        m.source_document_id = "e2".to_string();
        assert!(!m.is_self_mention());
    }

    #[test]
    fn document_kind_wire_names_are_snake_case() {
        let json = serde_json::to_string(&DocumentKind::ChatMessage).unwrap();
        assert_eq!(json, "\"chat_message\"");
        let back: DocumentKind = serde_json::from_str("\"codex_entry\"").unwrap();
        assert_eq!(back, DocumentKind::CodexEntry);
    }
}
