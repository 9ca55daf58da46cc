//! Database backups
//!
//! Files are named `comanda_{label}_{YYYYmmdd_HHMMSS}.db` and live in one
//! directory. After each backup the oldest files beyond the retention count
//! are deleted. Failures are logged by the callers and never stop the server.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use sqlx::SqlitePool;
use tokio::fs;

const PREFIX: &str = "comanda_";
const SUFFIX: &str = ".db";

#[derive(Debug, Clone)]
pub struct BackupService {
    dir: PathBuf,
    retention: usize,
}

impl BackupService {
    pub fn new(dir: PathBuf, retention: usize) -> Self {
        Self {
            dir,
            retention: retention.max(1),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, label: &str) -> PathBuf {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        self.dir.join(format!("{PREFIX}{label}_{stamp}{SUFFIX}"))
    }

    /// Plain file copy of a database that is not open yet.
    ///
    /// `Ok(None)` when there is nothing to copy.
    pub async fn copy_file(&self, source: &Path, label: &str) -> std::io::Result<Option<PathBuf>> {
        if !fs::try_exists(source).await? {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir).await?;
        let target = self.target(label);
        let bytes = fs::copy(source, &target).await?;
        tracing::info!(path = %target.display(), bytes, "Database backup written");
        self.prune().await?;
        Ok(Some(target))
    }

    /// Consistent snapshot of a live database via `VACUUM INTO`
    pub async fn snapshot(&self, pool: &SqlitePool, label: &str) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let target = self.target(label);
        if fs::try_exists(&target).await? {
            fs::remove_file(&target).await?;
        }
        sqlx::query("VACUUM INTO ?")
            .bind(target.to_string_lossy().into_owned())
            .execute(pool)
            .await?;
        // an in-memory database vacuums into memory and leaves no file
        anyhow::ensure!(
            fs::try_exists(&target).await?,
            "VACUUM INTO produced no file at {}",
            target.display()
        );
        tracing::info!(path = %target.display(), "Database snapshot written");
        self.prune().await?;
        Ok(target)
    }

    /// Backup files, oldest first
    pub async fn list(&self) -> std::io::Result<Vec<PathBuf>> {
        let mut found: Vec<(SystemTime, PathBuf)> = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_backup = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(PREFIX) && n.ends_with(SUFFIX));
            if !is_backup {
                continue;
            }
            let modified = entry.metadata().await?.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((modified, path));
        }
        found.sort();
        Ok(found.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete the oldest backups beyond the retention count.
    ///
    /// Returns the number of deleted files.
    pub async fn prune(&self) -> std::io::Result<usize> {
        let files = self.list().await?;
        let excess = files.len().saturating_sub(self.retention);
        let mut removed = 0;
        for path in files.into_iter().take(excess) {
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to delete old backup"),
            }
        }
        if removed > 0 {
            tracing::info!(count = removed, "Old backups pruned");
        }
        Ok(removed)
    }
}
