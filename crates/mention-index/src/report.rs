use serde::{Deserialize, Serialize};

/// Outcome of a rebuild or sync pass over one project.
///
/// Per-document failures do not abort the pass; they land in `errors` and
/// the run reports partial success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildReport {
    pub project_id: String,

    /// Documents scanned in this pass.
    pub documents: usize,

    /// Documents skipped because their content could not be served.
    pub skipped: usize,

    /// Codex entries in the alias table.
    pub entries: usize,

    /// Compiled alias patterns (names + aliases).
    pub aliases: usize,

    /// Mentions in the committed store after this pass.
    pub mentions: usize,

    /// Time taken in milliseconds.
    pub time_ms: u64,

    /// Per-document failures, one line each.
    pub errors: Vec<String>,

    /// True when this call yielded to a rebuild that completed while it
    /// waited, instead of running its own.
    pub coalesced: bool,
}

impl RebuildReport {
    #[must_use]
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            documents: 0,
            skipped: 0,
            entries: 0,
            aliases: 0,
            mentions: 0,
            time_ms: 0,
            errors: Vec::new(),
            coalesced: false,
        }
    }

    pub fn add_document(&mut self, mentions: usize) {
        self.documents += 1;
        self.mentions += mentions;
    }

    pub fn add_skipped(&mut self, error: String) {
        self.skipped += 1;
        self.errors.push(error);
    }
}
