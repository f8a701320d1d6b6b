use crate::error::{IndexError, Result};
use fs2::FileExt;
use std::path::PathBuf;
use std::time::Instant;

/// Cross-process exclusive lock on a project's index directory.
///
/// Read paths stay lock-free (atomic renames), but writes from concurrent
/// processes must not race. Released on drop.
pub(crate) struct IndexWriteLock {
    file: std::fs::File,
}

impl Drop for IndexWriteLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

pub(crate) async fn acquire_index_write_lock(lock_path: PathBuf) -> Result<IndexWriteLock> {
    if let Some(parent) = lock_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let lock = tokio::task::spawn_blocking(move || -> Result<IndexWriteLock> {
        use std::fs::OpenOptions;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|err| {
                IndexError::Other(format!("open index lock {}: {err}", lock_path.display()))
            })?;

        let start = Instant::now();
        file.lock_exclusive().map_err(|err| {
            IndexError::Other(format!("acquire index lock {}: {err}", lock_path.display()))
        })?;
        let waited_ms = start.elapsed().as_millis();
        if waited_ms > 0 {
            log::debug!(
                "index write lock {} acquired after {waited_ms}ms",
                lock_path.display()
            );
        }

        Ok(IndexWriteLock { file })
    })
    .await
    .map_err(|err| IndexError::Other(format!("join index lock task: {err}")))??;

    Ok(lock)
}
