//! # Storykit Mention Index
//!
//! Tracks every place a codex entry is referenced by name or alias across
//! a project's scenes, codex entries, snippets, and chat messages.
//!
//! ## Pipeline
//!
//! ```text
//! CodexSource ──> AliasTable (compiled match vocabulary)
//!                     │
//! DocumentSource ──> Scanner (whole words, longest match wins)
//!                     │
//!                     └──> MentionStore (per-project, atomic swap)
//!                              │
//!                              └──> MentionRepository (reads + rebuild)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use storykit_mention_index::{InMemoryProjectSource, LocalMentionRepository, MentionRepository};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let source = Arc::new(InMemoryProjectSource::new());
//!     let repo = LocalMentionRepository::new(".storykit", source.clone(), source);
//!
//!     let report = repo.rebuild_index("my-novel").await?;
//!     println!("{} mentions across {} documents", report.mentions, report.documents);
//!     Ok(())
//! }
//! ```

mod alias;
mod error;
mod gate;
mod index;
mod lock;
mod memory;
mod paths;
mod report;
mod repository;
mod scanner;
mod state;
mod store;

pub use alias::{AliasPattern, AliasTable};
pub use error::{IndexError, Result};
pub use index::MentionIndexer;
pub use memory::InMemoryProjectSource;
pub use paths::{
    index_dir_for_project, lock_path_for_project, mentions_path_for_project,
    state_path_for_project, INDEX_DIR_NAME, LOCK_FILE_NAME, MENTIONS_FILE_NAME, STATE_FILE_NAME,
};
pub use report::RebuildReport;
pub use repository::{LocalMentionRepository, MentionRepository};
pub use scanner::{scan_document, scan_text, RawMatch};
pub use state::{
    read_index_state, unix_time_ms, write_index_state, IndexState, INDEX_STATE_SCHEMA_VERSION,
};
pub use store::{text_fingerprint, DocumentMentions, MentionStore, MENTION_STORE_SCHEMA_VERSION};
