//! File system utils.

use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use anyhow::Context;
use fs2::FileExt;
use serde::Serialize;

pub struct FsHandler;

impl FsHandler {
    /// Create a directory (and its parents) if it doesn't exist.
    pub fn create_directory(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))?;
        tracing::debug!("Created directory: {}", path.display());

        Ok(())
    }

    /// Take an exclusive lock on `<dir>/.lock`.
    ///
    /// The lock is held until the returned file is dropped.
    pub fn lock_directory(dir: &Path) -> anyhow::Result<File> {
        let lock_path = dir.join(".lock");
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {}", lock_path.display()))?;

        file.try_lock_exclusive().with_context(|| {
            format!(
                "{} is locked: another deployment is running against it",
                dir.display()
            )
        })?;

        Ok(file)
    }

    /// Write `value` as pretty JSON, going through a temporary file so readers
    /// never observe a partial write.
    pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", path.display()))?;

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json)
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;

        Ok(())
    }
}
