use std::collections::BTreeMap;
use storykit_mention_index::{IndexState, RebuildReport};
use storykit_protocol::{CodexEntry, Mention};

pub fn render_rebuild(report: &RebuildReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Project `{}`\n", report.project_id));
    if report.coalesced {
        out.push_str("(coalesced with an in-flight rebuild)\n");
    }
    out.push_str(&format!(
        "- documents: {} scanned, {} skipped\n",
        report.documents, report.skipped
    ));
    out.push_str(&format!(
        "- vocabulary: {} entries, {} aliases\n",
        report.entries, report.aliases
    ));
    out.push_str(&format!("- mentions: {}\n", report.mentions));
    out.push_str(&format!("- time: {}ms\n", report.time_ms));
    for error in &report.errors {
        out.push_str(&format!("- skipped: {error}\n"));
    }
    out
}

pub fn render_mentions(codex_entry_id: &str, mentions: &[Mention]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} mention(s) of `{codex_entry_id}`\n\n",
        mentions.len()
    ));
    if mentions.is_empty() {
        return out;
    }
    out.push_str("| document | kind | span | text |\n");
    out.push_str("|---|---|---:|---|\n");
    for mention in mentions {
        out.push_str(&format!(
            "| `{}` | {} | {}..{} | `{}` |\n",
            mention.source_document_id,
            mention.source_document_kind.as_str(),
            mention.start,
            mention.end,
            mention.matched_text,
        ));
    }
    out
}

#[derive(Debug, serde::Serialize)]
pub struct EntrySummary {
    pub codex_entry_id: String,
    pub name: String,
    pub mentions: usize,
    pub self_mentions: usize,
}

#[derive(Debug, serde::Serialize)]
pub struct ProjectSummary {
    pub entries: Vec<EntrySummary>,
    pub total_mentions: usize,
}

/// The repository omits entries with zero mentions; the report diffs the
/// mention map against the codex entry list so they still show up.
pub fn project_summary(
    entries: &[CodexEntry],
    all: &BTreeMap<String, Vec<Mention>>,
) -> ProjectSummary {
    let mut rows: Vec<EntrySummary> = entries
        .iter()
        .map(|entry| {
            let mentions = all.get(&entry.id).map_or(&[][..], Vec::as_slice);
            EntrySummary {
                codex_entry_id: entry.id.clone(),
                name: entry.name.clone(),
                mentions: mentions.len(),
                self_mentions: mentions.iter().filter(|m| m.is_self_mention()).count(),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.name.cmp(&b.name)));

    ProjectSummary {
        total_mentions: all.values().map(Vec::len).sum(),
        entries: rows,
    }
}

pub fn render_project(
    project_id: &str,
    entries: &[CodexEntry],
    all: &BTreeMap<String, Vec<Mention>>,
) -> String {
    let summary = project_summary(entries, all);

    let mut out = String::new();
    out.push_str(&format!("# Mention report for `{project_id}`\n\n"));
    out.push_str(&format!(
        "- Codex entries: {}\n- Mentions: {}\n\n",
        entries.len(),
        summary.total_mentions
    ));
    out.push_str("| entry | name | mentions | self |\n");
    out.push_str("|---|---|---:|---:|\n");
    for row in &summary.entries {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} |\n",
            row.codex_entry_id, row.name, row.mentions, row.self_mentions
        ));
    }
    out
}

pub fn render_state(state: &IndexState) -> String {
    let mut out = String::new();
    out.push_str(&format!("Project `{}`\n", state.project_id));
    out.push_str(&format!("- freshness: {:?}\n", state.freshness));
    match state.built_at_unix_ms {
        Some(ms) => out.push_str(&format!("- built at: {ms} (unix ms)\n")),
        None => out.push_str("- built at: never\n"),
    }
    if !state.last_errors.is_empty() {
        out.push_str(&format!("- last rebuild skipped {} document(s):\n", state.last_errors.len()));
        for error in &state.last_errors {
            out.push_str(&format!("  - {error}\n"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use storykit_protocol::DocumentKind;

    fn mention(entry: &str, doc: &str, kind: DocumentKind) -> Mention {
        Mention {
            project_id: "p1".to_string(),
            codex_entry_id: entry.to_string(),
            source_document_id: doc.to_string(),
            source_document_kind: kind,
            start: 0,
            end: 4,
            matched_text: "Anna".to_string(),
        }
    }

    #[test]
    fn summary_includes_zero_mention_entries() {
        let entries = vec![
            CodexEntry {
                id: "anna".to_string(),
                project_id: "p1".to_string(),
                name: "Anna".to_string(),
                aliases: Vec::new(),
            },
            CodexEntry {
                id: "ghost".to_string(),
                project_id: "p1".to_string(),
                name: "Ghost".to_string(),
                aliases: Vec::new(),
            },
        ];
        let mut all = BTreeMap::new();
        all.insert(
            "anna".to_string(),
            vec![
                mention("anna", "scene-1", DocumentKind::Scene),
                mention("anna", "anna", DocumentKind::CodexEntry),
            ],
        );

        let summary = project_summary(&entries, &all);
        assert_eq!(summary.total_mentions, 2);
        assert_eq!(summary.entries.len(), 2);
        assert_eq!(summary.entries[0].codex_entry_id, "anna");
        assert_eq!(summary.entries[0].self_mentions, 1);
        assert_eq!(summary.entries[1].mentions, 0);
    }
}
