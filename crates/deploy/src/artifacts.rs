//! Compiled contract artifacts in the Hardhat layout.
//!
//! ```text
//! artifacts/
//!   build-info/<id>.json
//!   contracts/FundMe.sol/FundMe.json
//!   contracts/FundMe.sol/FundMe.dbg.json
//! ```

use std::path::{Path, PathBuf};

use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    /// Source file the contract is defined in, e.g. `contracts/FundMe.sol`.
    pub source_name: String,
    pub abi: Value,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl Artifact {
    /// Fully qualified name: `<source>:<contract>`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

/// Debug file written next to each artifact.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    /// Path of the build info, relative to the debug file.
    build_info: PathBuf,
}

/// The compiler run that produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_version: String,
    /// Full compiler version, e.g. `0.8.24+commit.e11b9ed9`.
    pub solc_long_version: String,
    /// Standard JSON input given to the compiler.
    pub input: Value,
}

/// Reads artifacts below an `artifacts/` directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate `<name>.json` anywhere below the root, build info excluded.
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        let file_name = format!("{}.json", name);
        let mut matches = Vec::new();
        find_files(&self.root, &file_name, &mut matches).context(format!(
            "Failed to scan artifacts directory {}",
            self.root.display()
        ))?;

        match matches.len() {
            0 => anyhow::bail!(
                "No artifact for contract '{}' in {} (compile the contracts first)",
                name,
                self.root.display()
            ),
            1 => Ok(matches.remove(0)),
            _ => anyhow::bail!(
                "Several artifacts named '{}' in {}: {}",
                name,
                self.root.display(),
                matches
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }

    pub fn load(&self, name: &str) -> Result<Artifact> {
        let path = self.artifact_path(name)?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse artifact {}", path.display()))
    }

    /// Build info of the compiler run that produced `name`.
    pub fn build_info(&self, name: &str) -> Result<BuildInfo> {
        let artifact_path = self.artifact_path(name)?;
        let debug_path = artifact_path.with_file_name(format!("{}.dbg.json", name));

        let content = std::fs::read_to_string(&debug_path)
            .with_context(|| format!("Failed to read {}", debug_path.display()))?;
        let debug: DebugFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", debug_path.display()))?;

        let build_info_path = debug_path
            .parent()
            .context("Debug file must have a parent directory")?
            .join(&debug.build_info);
        let content = std::fs::read_to_string(&build_info_path)
            .with_context(|| format!("Failed to read build info {}", build_info_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse build info {}", build_info_path.display()))
    }
}

fn find_files(dir: &Path, file_name: &str, matches: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|n| n == BUILD_INFO_DIR) {
                continue;
            }
            find_files(&path, file_name, matches)?;
        } else if path.file_name().is_some_and(|n| n == file_name) {
            matches.push(path);
        }
    }
    Ok(())
}
