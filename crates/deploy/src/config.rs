//! Project configuration (`fundme.toml`).
//!
//! Values are layered with figment: built-in defaults (including the well-known
//! environment variables), then the TOML file, then `FUNDME_`-prefixed variables
//! where `__` separates nested keys (`FUNDME_NETWORKS__SEPOLIA__URL`).

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::network::{DEVELOPMENT_CHAIN_ID, Network, SEPOLIA_CHAIN_ID};

/// The default name for the project configuration file.
pub const CONFIG_FILENAME: &str = "fundme.toml";

/// Default Etherscan endpoint (multichain v2 API).
pub const DEFAULT_ETHERSCAN_API_URL: &str = "https://api.etherscan.io/v2/api";

const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:8545";
const DEFAULT_TIMEOUT_SECS: u64 = 100;

pub const SEPOLIA_URL_ENV: &str = "SEPOLIA_URL";
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";
pub const PRIVATE_KEY_1_ENV: &str = "PRIVATE_KEY_1";
pub const ETHERSCAN_API_KEY_ENV: &str = "ETHERSCAN_API_KEY";

/// Configuration of a single network.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkUserConfig {
    /// JSON-RPC endpoint. Required before the network can be used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Expected chain ID. When absent, the node's chain ID is used as is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Hex private keys. Empty means the node manages the accounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl std::fmt::Debug for NetworkUserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworkUserConfig")
            .field("url", &self.url)
            .field("chain_id", &self.chain_id)
            .field("accounts", &format_args!("<{} keys>", self.accounts.len()))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl NetworkUserConfig {
    fn local() -> Self {
        Self {
            url: Some(DEFAULT_LOCAL_URL.to_string()),
            chain_id: Some(DEVELOPMENT_CHAIN_ID),
            accounts: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Block explorer settings used for source verification.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtherscanConfig {
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for EtherscanConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtherscanConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for EtherscanConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_ETHERSCAN_API_URL.to_string(),
            api_key: None,
        }
    }
}

impl EtherscanConfig {
    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Indices of the named accounts in a network's account list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedAccounts {
    pub first_account: usize,
    pub second_account: usize,
}

impl Default for NamedAccounts {
    fn default() -> Self {
        Self {
            first_account: 0,
            second_account: 1,
        }
    }
}

/// Project directories, relative to the working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Compiled contract artifacts (Hardhat layout).
    pub artifacts: PathBuf,
    /// Deployment records, one sub-directory per network.
    pub deployments: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            artifacts: PathBuf::from("artifacts"),
            deployments: PathBuf::from("deployments"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityConfig {
    /// Compiler version the artifacts are expected to be built with.
    pub version: String,
}

impl Default for SolidityConfig {
    fn default() -> Self {
        Self {
            version: "0.8.24".to_string(),
        }
    }
}

/// Full project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Network used when none is given on the command line.
    pub default_network: String,
    pub networks: BTreeMap<String, NetworkUserConfig>,
    pub etherscan: EtherscanConfig,
    pub named_accounts: NamedAccounts,
    pub paths: PathsConfig,
    pub solidity: SolidityConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        let networks = BTreeMap::from([
            ("hardhat".to_string(), NetworkUserConfig::local()),
            ("local".to_string(), NetworkUserConfig::local()),
            (
                "sepolia".to_string(),
                NetworkUserConfig {
                    url: None,
                    chain_id: Some(SEPOLIA_CHAIN_ID),
                    accounts: Vec::new(),
                    timeout_secs: DEFAULT_TIMEOUT_SECS,
                },
            ),
        ]);

        Self {
            default_network: "hardhat".to_string(),
            networks,
            etherscan: EtherscanConfig::default(),
            named_accounts: NamedAccounts::default(),
            paths: PathsConfig::default(),
            solidity: SolidityConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Defaults completed with `SEPOLIA_URL`, `PRIVATE_KEY`, `PRIVATE_KEY_1` and
    /// `ETHERSCAN_API_KEY`, read through `lookup`.
    pub fn with_env_defaults(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(sepolia) = config.networks.get_mut("sepolia") {
            sepolia.url = var(SEPOLIA_URL_ENV);
            sepolia.accounts = [PRIVATE_KEY_ENV, PRIVATE_KEY_1_ENV]
                .into_iter()
                .filter_map(var)
                .collect();
        }
        config.etherscan.api_key = var(ETHERSCAN_API_KEY_ENV);

        config
    }

    /// Load the configuration from `path` (or `./fundme.toml`), layered over the
    /// environment-aware defaults. A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(CONFIG_FILENAME));

        if path.exists() {
            tracing::debug!(path = %path.display(), "Loading project configuration");
        } else {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
        }

        let defaults = Self::with_env_defaults(|name| std::env::var(name).ok());
        let config: Self = Figment::from(Serialized::defaults(defaults))
            .merge(Toml::file(path))
            .merge(Env::prefixed("FUNDME_").split("__"))
            .extract()
            .context(format!(
                "Failed to load configuration from {}",
                path.display()
            ))?;

        Ok(config)
    }

    /// Write the configuration as TOML.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;
        std::fs::write(path, content)
            .context(format!("Failed to write config to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Configuration of the network called `name`.
    pub fn network_config(&self, name: &str) -> Result<&NetworkUserConfig> {
        self.networks.get(name).with_context(|| {
            format!(
                "Network '{}' is not configured (known networks: {})",
                name,
                self.networks.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }

    /// Resolve a network without contacting it. `chain_id` is the chain ID
    /// reported by the node, checked against the configured one.
    pub fn resolve_network(&self, name: &str, chain_id: u64) -> Result<Network> {
        let network = self.network_config(name)?;

        if let Some(expected) = network.chain_id {
            if expected != chain_id {
                anyhow::bail!(
                    "Network '{}' is configured for chain ID {} but its node reports {}",
                    name,
                    expected,
                    chain_id
                );
            }
        }

        Ok(Network {
            name: name.to_string(),
            chain_id,
            url: self.network_url(name)?,
            timeout: Duration::from_secs(network.timeout_secs),
        })
    }

    /// Parsed RPC URL of a network.
    pub fn network_url(&self, name: &str) -> Result<Url> {
        let network = self.network_config(name)?;
        let url = network.url.as_deref().with_context(|| {
            format!(
                "Network '{}' has no RPC URL (set `networks.{}.url` or {} for sepolia)",
                name, name, SEPOLIA_URL_ENV
            )
        })?;

        Url::parse(url).context(format!("Invalid RPC URL for network '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.default_network, "hardhat");
        assert_eq!(config.networks.len(), 3);
        assert_eq!(
            config.networks["local"].chain_id,
            Some(DEVELOPMENT_CHAIN_ID)
        );
        assert_eq!(config.networks["sepolia"].chain_id, Some(SEPOLIA_CHAIN_ID));
        assert!(config.networks["sepolia"].url.is_none());
        assert_eq!(config.named_accounts.first_account, 0);
        assert_eq!(config.named_accounts.second_account, 1);
        assert!(config.etherscan.api_key().is_none());
    }

    #[test]
    fn test_env_defaults() {
        let config = ProjectConfig::with_env_defaults(|name| match name {
            SEPOLIA_URL_ENV => Some("https://sepolia.example".to_string()),
            PRIVATE_KEY_ENV => Some("0x01".to_string()),
            PRIVATE_KEY_1_ENV => Some("".to_string()),
            ETHERSCAN_API_KEY_ENV => Some("KEY".to_string()),
            _ => None,
        });

        let sepolia = &config.networks["sepolia"];
        assert_eq!(sepolia.url.as_deref(), Some("https://sepolia.example"));
        assert_eq!(sepolia.accounts, vec!["0x01".to_string()]);
        assert_eq!(config.etherscan.api_key(), Some("KEY"));
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let config = EtherscanConfig {
            api_url: DEFAULT_ETHERSCAN_API_URL.to_string(),
            api_key: Some("   ".to_string()),
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_load_layers_file_and_env() {
        Jail::expect_with(|jail| {
            jail.set_env(SEPOLIA_URL_ENV, "https://from-env.example");
            jail.set_env(ETHERSCAN_API_KEY_ENV, "ABC");
            jail.create_file(
                CONFIG_FILENAME,
                r#"
                default_network = "local"

                [networks.sepolia]
                timeout_secs = 30

                [networks.bnb]
                url = "https://bnb.example"
                chain_id = 97
                "#,
            )?;
            jail.set_env("FUNDME_NETWORKS__LOCAL__URL", "http://127.0.0.1:9545");

            let config = ProjectConfig::load(None).map_err(|e| e.to_string())?;

            assert_eq!(config.default_network, "local");
            assert_eq!(
                config.networks["sepolia"].url.as_deref(),
                Some("https://from-env.example")
            );
            assert_eq!(config.networks["sepolia"].timeout_secs, 30);
            assert_eq!(config.networks["bnb"].chain_id, Some(97));
            assert_eq!(
                config.networks["local"].url.as_deref(),
                Some("http://127.0.0.1:9545")
            );
            assert_eq!(config.etherscan.api_key(), Some("ABC"));
            Ok(())
        });
    }

    #[test]
    fn test_resolve_network() {
        let config = ProjectConfig::default();

        let network = config.resolve_network("local", DEVELOPMENT_CHAIN_ID).unwrap();
        assert_eq!(network.name, "local");
        assert_eq!(network.url.as_str(), "http://127.0.0.1:8545/");
        assert!(network.is_development());

        let err = config.resolve_network("local", 1).unwrap_err();
        assert!(err.to_string().contains("configured for chain ID 31337"));

        let err = config.resolve_network("sepolia", SEPOLIA_CHAIN_ID).unwrap_err();
        assert!(err.to_string().contains("no RPC URL"));

        let err = config.resolve_network("mainnet", 1).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir::TempDir::new("fundme-config").unwrap();
        let path = dir.path().join(CONFIG_FILENAME);

        let config = ProjectConfig::default();
        config.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let reloaded: ProjectConfig = toml::from_str(&content).unwrap();
        assert_eq!(reloaded, config);
    }
}
