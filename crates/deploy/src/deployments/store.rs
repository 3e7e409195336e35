use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use super::DeploymentRecord;
use crate::fs::FsHandler;

/// File holding the chain ID a network's deployments belong to.
const CHAIN_ID_FILENAME: &str = ".chainId";

/// Deployment records of one network: `<root>/<network>/<Contract>.json`.
#[derive(Debug)]
pub struct DeploymentStore {
    dir: PathBuf,
    /// Exclusive lock, held while the store is open for writing.
    _lock: Option<File>,
}

impl DeploymentStore {
    /// Open the store of `network` for writing: create its directory and take
    /// the network lock.
    pub fn open(root: &Path, network: &str) -> Result<Self> {
        let dir = root.join(network);
        FsHandler::create_directory(&dir)?;
        let lock = FsHandler::lock_directory(&dir)?;

        Ok(Self {
            dir,
            _lock: Some(lock),
        })
    }

    /// Check that the records belong to `chain_id`, recording it on first use.
    pub fn ensure_chain_id(&self, chain_id: u64) -> Result<()> {
        let chain_id_path = self.dir.join(CHAIN_ID_FILENAME);
        if !chain_id_path.exists() {
            return std::fs::write(&chain_id_path, chain_id.to_string())
                .with_context(|| format!("Failed to write {}", chain_id_path.display()));
        }

        let recorded = std::fs::read_to_string(&chain_id_path)
            .with_context(|| format!("Failed to read {}", chain_id_path.display()))?;
        let recorded: u64 = recorded
            .trim()
            .parse()
            .with_context(|| format!("Invalid chain ID in {}", chain_id_path.display()))?;

        if recorded != chain_id {
            anyhow::bail!(
                "Deployments in {} belong to chain {} but the node reports chain {} (use --reset to start over)",
                self.dir.display(),
                recorded,
                chain_id
            );
        }

        Ok(())
    }

    /// Open the store of `network` for reading only. No lock is taken.
    pub fn read_only(root: &Path, network: &str) -> Self {
        Self {
            dir: root.join(network),
            _lock: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Delete every record of the network and restart from `chain_id`.
    pub fn reset(&self, chain_id: u64) -> Result<()> {
        for path in self.record_paths()? {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }

        let chain_id_path = self.dir.join(CHAIN_ID_FILENAME);
        std::fs::write(&chain_id_path, chain_id.to_string())
            .with_context(|| format!("Failed to write {}", chain_id_path.display()))?;

        tracing::info!(dir = %self.dir.display(), "Deployments reset");
        Ok(())
    }

    pub fn save(&self, record: &DeploymentRecord) -> Result<()> {
        let path = self.record_path(&record.contract_name);
        FsHandler::write_json(&path, record)?;
        tracing::debug!(path = %path.display(), "Deployment saved");
        Ok(())
    }

    /// The record of `name`, if there is one.
    pub fn load(&self, name: &str) -> Result<Option<DeploymentRecord>> {
        let path = self.record_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let record = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deployment {}", path.display()))?;

        Ok(Some(record))
    }

    /// All records, sorted by contract name.
    pub fn list(&self) -> Result<Vec<DeploymentRecord>> {
        let mut records = Vec::new();
        for path in self.record_paths()? {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            records.push(
                serde_json::from_str::<DeploymentRecord>(&content)
                    .with_context(|| format!("Failed to parse deployment {}", path.display()))?,
            );
        }
        records.sort_by(|a, b| a.contract_name.cmp(&b.contract_name));
        Ok(records)
    }

    fn record_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}
