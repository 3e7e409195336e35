//! Builder module for creating a [`Deployer`].
//!
//! The builder resolves the selected network from the project configuration and
//! asks its node for the chain ID, so that a [`Deployer`] always targets a
//! reachable node whose chain matches the configuration.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::{Deployer, config::ProjectConfig, rpc::RpcClient};

/// How long to wait for the node to answer `eth_chainId`.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builder for creating a [`Deployer`].
///
/// # Example
///
/// ```no_run
/// use fundme_deploy::{DeployerBuilder, ProjectConfig};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = ProjectConfig::load(None)?;
/// let deployer = DeployerBuilder::new(config)
///     .network("sepolia")
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DeployerBuilder {
    config: ProjectConfig,
    /// The network name (optional, `default_network` if not provided).
    network: Option<String>,
    connect_timeout: Duration,
}

impl DeployerBuilder {
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            network: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the network to deploy to.
    pub fn network(mut self, name: impl Into<String>) -> Self {
        self.network = Some(name.into());
        self
    }

    /// Set how long to wait for the node before giving up.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Name of the network the deployer will target.
    pub fn network_name(&self) -> &str {
        self.network
            .as_deref()
            .unwrap_or(&self.config.default_network)
    }

    /// Build the [`Deployer`].
    ///
    /// Fails when the network is not configured, has no URL, its node cannot be
    /// reached, or the node reports another chain than the configured one.
    pub async fn build(self) -> Result<Deployer> {
        let name = self.network_name().to_string();
        let url = self.config.network_url(&name)?;
        let rpc = RpcClient::new(url.clone())?;

        tracing::debug!(network = %name, url = %url, "Connecting to node");

        let chain_id = tokio::time::timeout(self.connect_timeout, rpc.chain_id())
            .await
            .map_err(|_| anyhow::anyhow!("Timed out connecting to {}", url))?
            .with_context(|| format!("Failed to reach the node of network '{}' at {}", name, url))?;

        let network = self.config.resolve_network(&name, chain_id)?;

        tracing::info!(network = %network.name, chain_id, "Connected");

        Ok(Deployer::new(self.config, network, rpc))
    }
}
