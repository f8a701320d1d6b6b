//! The mention scanner: a pure function of (document text, alias table).
//!
//! Matching rules:
//! - case-insensitive literal match per alias,
//! - whole words only (a match may not sit inside a larger word),
//! - at a given start position the longest boundary-valid alias wins,
//!   ties broken by registration order,
//! - an accepted match suppresses candidates starting inside its span.
//!
//! Output offsets are character offsets into the scanned text.

use crate::alias::AliasTable;
use storykit_protocol::{Document, Mention};

/// A scanner match before it is tied to a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    pub codex_entry_id: String,
    pub start: usize,
    pub end: usize,
    pub matched_text: String,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    pattern: usize,
}

pub fn scan_text(text: &str, table: &AliasTable) -> Vec<RawMatch> {
    if text.is_empty() || table.is_empty() {
        return Vec::new();
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    for pattern in table.prefilter().matches(text) {
        for m in table.regexes()[pattern].find_iter(text) {
            if !word_bounded(text, m.start(), m.end()) {
                continue;
            }
            candidates.push(Candidate {
                start: m.start(),
                end: m.end(),
                pattern,
            });
        }
    }

    // Longest alias first at each start position, then registration order.
    candidates.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.end.cmp(&a.end))
            .then_with(|| a.pattern.cmp(&b.pattern))
    });

    let mut accepted: Vec<Candidate> = Vec::new();
    let mut cursor = 0usize;
    for candidate in candidates {
        if candidate.start < cursor {
            continue;
        }
        cursor = candidate.end;
        accepted.push(candidate);
    }

    // Accepted spans are disjoint and ascending; convert byte offsets to
    // character offsets in one pass.
    let mut out = Vec::with_capacity(accepted.len());
    let mut char_count = 0usize;
    let mut last_byte = 0usize;
    for candidate in accepted {
        char_count += text[last_byte..candidate.start].chars().count();
        let start = char_count;
        char_count += text[candidate.start..candidate.end].chars().count();
        last_byte = candidate.end;

        out.push(RawMatch {
            codex_entry_id: table.patterns()[candidate.pattern].codex_entry_id.clone(),
            start,
            end: char_count,
            matched_text: text[candidate.start..candidate.end].to_string(),
        });
    }
    out
}

/// Scan one document and produce persisted-shape mentions.
#[must_use]
pub fn scan_document(document: &Document, table: &AliasTable) -> Vec<Mention> {
    scan_text(&document.text, table)
        .into_iter()
        .map(|m| Mention {
            project_id: document.project_id.clone(),
            codex_entry_id: m.codex_entry_id,
            source_document_id: document.id.clone(),
            source_document_kind: document.kind,
            start: m.start,
            end: m.end,
            matched_text: m.matched_text,
        })
        .collect()
}

fn word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !c.is_alphanumeric());
    let after_ok = text[end..]
        .chars()
        .next()
        .is_none_or(|c| !c.is_alphanumeric());
    before_ok && after_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use storykit_protocol::CodexEntry;

    fn entry(id: &str, name: &str, aliases: &[&str]) -> CodexEntry {
        CodexEntry {
            id: id.to_string(),
            project_id: "p1".to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn table(entries: &[CodexEntry]) -> AliasTable {
        AliasTable::compile(entries).unwrap()
    }

    fn spans(matches: &[RawMatch]) -> Vec<(&str, usize, usize)> {
        matches
            .iter()
            .map(|m| (m.codex_entry_id.as_str(), m.start, m.end))
            .collect()
    }

    #[test]
    fn matches_are_whole_words_only() {
        let t = table(&[entry("ann", "Ann", &[])]);
        let found = scan_text("Anna met Ann in the garden", &t);
        assert_eq!(spans(&found), vec![("ann", 9, 12)]);
        assert_eq!(found[0].matched_text, "Ann");
    }

    #[test]
    fn matching_is_case_insensitive_but_preserves_source_casing() {
        let t = table(&[entry("ann", "Ann", &[])]);
        let found = scan_text("ANN shouted. ann whispered.", &t);
        assert_eq!(spans(&found), vec![("ann", 0, 3), ("ann", 13, 16)]);
        assert_eq!(found[0].matched_text, "ANN");
        assert_eq!(found[1].matched_text, "ann");
    }

    #[test]
    fn longest_alias_wins_at_a_start_position() {
        let t = table(&[entry("smith", "Smith", &[]), entry("dr", "Dr. Smith", &[])]);
        let found = scan_text("Dr. Smith frowned", &t);
        assert_eq!(spans(&found), vec![("dr", 0, 9)]);
    }

    #[test]
    fn overlapped_inner_matches_are_suppressed() {
        // "Smith" at offset 4 starts inside the accepted "Dr. Smith" span.
        let t = table(&[entry("dr", "Dr. Smith", &[]), entry("smith", "Smith", &[])]);
        let found = scan_text("Dr. Smith met Smith", &t);
        assert_eq!(spans(&found), vec![("dr", 0, 9), ("smith", 14, 19)]);
    }

    #[test]
    fn registration_order_breaks_equal_length_ties() {
        let t = table(&[entry("first", "Ann", &[]), entry("second", "Ann", &[])]);
        let found = scan_text("Ann paused", &t);
        assert_eq!(spans(&found), vec![("first", 0, 3)]);
    }

    #[test]
    fn shorter_alias_wins_when_longer_fails_the_boundary() {
        let t = table(&[entry("ma", "Mary Ann", &["Mary"])]);
        let found = scan_text("Mary Anne arrived", &t);
        assert_eq!(spans(&found), vec![("ma", 0, 4)]);
        assert_eq!(found[0].matched_text, "Mary");
    }

    #[test]
    fn offsets_are_character_offsets() {
        let t = table(&[entry("zoe", "Zoë", &[])]);
        let text = "Café: Zoë smiled";
        let found = scan_text(text, &t);
        assert_eq!(spans(&found), vec![("zoe", 6, 9)]);
        let by_chars: String = text.chars().skip(6).take(3).collect();
        assert_eq!(by_chars, "Zoë");
    }

    #[test]
    fn punctuation_adjacent_names_still_anchor() {
        let t = table(&[entry("ann", "Ann", &[])]);
        let found = scan_text("\"Ann!\" she cried. (Ann.)", &t);
        assert_eq!(spans(&found), vec![("ann", 1, 4), ("ann", 19, 22)]);
    }

    #[test]
    fn empty_text_or_table_yields_nothing() {
        let t = table(&[entry("ann", "Ann", &[])]);
        assert!(scan_text("", &t).is_empty());

        let empty = table(&[]);
        assert!(scan_text("Ann met Ann", &empty).is_empty());
    }

    #[test]
    fn matches_within_a_document_are_offset_ordered() {
        let t = table(&[entry("ann", "Ann", &[]), entry("smith", "Smith", &[])]);
        let found = scan_text("Smith nodded at Ann, then Smith left", &t);
        assert_eq!(
            spans(&found),
            vec![("smith", 0, 5), ("ann", 16, 19), ("smith", 26, 31)]
        );
    }

    #[test]
    fn scan_document_stamps_source_fields() {
        let t = table(&[entry("ann", "Ann", &[])]);
        let doc = Document {
            id: "scene-1".to_string(),
            project_id: "p1".to_string(),
            kind: storykit_protocol::DocumentKind::Scene,
            text: "Ann waited.".to_string(),
        };
        let mentions = scan_document(&doc, &t);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].source_document_id, "scene-1");
        assert_eq!(mentions[0].project_id, "p1");
        assert!(!mentions[0].is_self_mention());
    }
}
