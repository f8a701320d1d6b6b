//! Archive watch loop: debounce filesystem events on the project archive
//! and reconcile the mention index after each quiet period.

use anyhow::{Context, Result};
use notify::{RecursiveMode, Watcher};
use std::time::Duration;
use storykit_mention_index::LocalMentionRepository;
use storykit_project_store::LocalProjectStore;

pub async fn run(
    repo: &LocalMentionRepository,
    store: &LocalProjectStore,
    project_id: &str,
    debounce_ms: u64,
) -> Result<()> {
    let archive = store.archive_path(project_id);
    // Watch the parent directory: archive commits are atomic renames, which
    // replace the file a direct watch would be pinned to.
    let dir = archive
        .parent()
        .context("project archive path has no parent directory")?
        .to_path_buf();
    tokio::fs::create_dir_all(&dir).await?;

    let archive_name = archive.file_name().map(std::ffi::OsStr::to_os_string);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else {
            return;
        };
        let relevant = event
            .paths
            .iter()
            .any(|p| p.file_name() == archive_name.as_deref());
        if relevant {
            let _ = tx.send(());
        }
    })?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("watch {}", dir.display()))?;

    log::info!(
        "Watching {} for changes (debounce {debounce_ms}ms); Ctrl-C to stop",
        archive.display()
    );

    loop {
        if rx.recv().await.is_none() {
            return Ok(());
        }

        // Swallow the burst: wait for a quiet period before syncing.
        loop {
            match tokio::time::timeout(Duration::from_millis(debounce_ms), rx.recv()).await {
                Ok(Some(())) => {}
                Ok(None) => return Ok(()),
                Err(_) => break,
            }
        }

        match repo.sync(project_id).await {
            Ok(report) => log::info!(
                "Synced {project_id}: {} rescanned, {} skipped, {} mentions",
                report.documents,
                report.skipped,
                report.mentions
            ),
            Err(err) => log::warn!("Sync of {project_id} failed: {err}"),
        }
    }
}
