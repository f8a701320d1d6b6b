use crate::error::{IndexError, Result};
use regex::{Regex, RegexSet};
use sha2::{Digest, Sha256};
use storykit_protocol::CodexEntry;

/// One compiled match pattern: a codex entry's canonical name or alias.
///
/// Pattern order is registration order (codex-source entry order, name
/// before aliases) and breaks scan ties.
#[derive(Debug, Clone)]
pub struct AliasPattern {
    pub codex_entry_id: String,
    pub alias: String,
}

/// The match vocabulary for one project, compiled from its codex entries.
///
/// Each alias becomes a case-insensitive literal pattern. A `RegexSet` over
/// all patterns rejects documents that mention nothing in a single pass;
/// only the patterns the set reports are then position-scanned.
pub struct AliasTable {
    patterns: Vec<AliasPattern>,
    regexes: Vec<Regex>,
    prefilter: RegexSet,
    entry_count: usize,
}

impl AliasTable {
    pub fn compile(entries: &[CodexEntry]) -> Result<Self> {
        let mut patterns: Vec<AliasPattern> = Vec::new();
        let mut sources: Vec<String> = Vec::new();

        for entry in entries {
            for name in entry.match_names() {
                let duplicate = patterns.iter().any(|p| {
                    p.codex_entry_id == entry.id && p.alias.eq_ignore_ascii_case(name)
                });
                if duplicate {
                    continue;
                }
                patterns.push(AliasPattern {
                    codex_entry_id: entry.id.clone(),
                    alias: name.to_string(),
                });
                sources.push(format!("(?i){}", regex::escape(name)));
            }
        }

        let regexes = sources
            .iter()
            .map(|src| Regex::new(src))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|err| IndexError::AliasPattern(err.to_string()))?;
        let prefilter =
            RegexSet::new(&sources).map_err(|err| IndexError::AliasPattern(err.to_string()))?;

        Ok(Self {
            patterns,
            regexes,
            prefilter,
            entry_count: entries.len(),
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entry_count
    }

    /// Stable fingerprint of the compiled vocabulary. A changed fingerprint
    /// means every document's stored scan result is suspect, regardless of
    /// document fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Sha256::new();
        for pattern in &self.patterns {
            hasher.update(pattern.codex_entry_id.as_bytes());
            hasher.update([0x1f]);
            hasher.update(pattern.alias.as_bytes());
            hasher.update([0x1e]);
        }
        let digest = hasher.finalize();
        u64::from_be_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ])
    }

    #[must_use]
    pub(crate) fn patterns(&self) -> &[AliasPattern] {
        &self.patterns
    }

    #[must_use]
    pub(crate) fn regexes(&self) -> &[Regex] {
        &self.regexes
    }

    #[must_use]
    pub(crate) const fn prefilter(&self) -> &RegexSet {
        &self.prefilter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, name: &str, aliases: &[&str]) -> CodexEntry {
        CodexEntry {
            id: id.to_string(),
            project_id: "p1".to_string(),
            name: name.to_string(),
            aliases: aliases.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn compiles_name_then_aliases_in_registration_order() {
        let table = AliasTable::compile(&[
            entry("e1", "Anna Karenina", &["Anna"]),
            entry("e2", "Dr. Smith", &["Smith"]),
        ])
        .unwrap();

        let aliases: Vec<&str> = table.patterns().iter().map(|p| p.alias.as_str()).collect();
        assert_eq!(aliases, vec!["Anna Karenina", "Anna", "Dr. Smith", "Smith"]);
        assert_eq!(table.entry_count(), 2);
    }

    #[test]
    fn duplicate_aliases_within_an_entry_collapse() {
        let table = AliasTable::compile(&[entry("e1", "Anna", &["anna", "ANNA", "Annie"])]).unwrap();
        assert_eq!(table.pattern_count(), 2);
    }

    #[test]
    fn duplicate_aliases_across_entries_are_kept() {
        let table = AliasTable::compile(&[
            entry("e1", "Ann", &[]),
            entry("e2", "Ann", &[]),
        ])
        .unwrap();
        assert_eq!(table.pattern_count(), 2);
    }

    #[test]
    fn fingerprint_tracks_vocabulary_changes() {
        let a = AliasTable::compile(&[entry("e1", "Anna", &[])]).unwrap();
        let b = AliasTable::compile(&[entry("e1", "Anna", &[])]).unwrap();
        let c = AliasTable::compile(&[entry("e1", "Anna", &["Annie"])]).unwrap();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn entries_without_usable_names_yield_an_empty_table() {
        let table = AliasTable::compile(&[entry("e1", "  ", &[""])]).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.entry_count(), 1);
    }
}
