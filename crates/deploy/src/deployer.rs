use anyhow::{Context, Result};

use crate::{
    artifacts::ArtifactStore,
    config::ProjectConfig,
    deployments::{ChainDeployments, DeploymentRecord, DeploymentStore},
    network::Network,
    rpc::RpcClient,
    scripts::{DeployContext, ScriptPlan, Tag},
    verify::{EtherscanVerifier, VerificationRequest, Verifier},
    wallet::Accounts,
};

/// Runs the deploy scripts against one network.
///
/// Built by [`crate::DeployerBuilder`] once the network's node has been reached.
#[derive(Debug, Clone)]
pub struct Deployer {
    pub config: ProjectConfig,
    pub network: Network,
    rpc: RpcClient,
}

impl Deployer {
    pub(crate) fn new(config: ProjectConfig, network: Network, rpc: RpcClient) -> Self {
        Self {
            config,
            network,
            rpc,
        }
    }

    fn artifacts(&self) -> ArtifactStore {
        ArtifactStore::new(&self.config.paths.artifacts)
    }

    fn verifier(&self) -> Result<EtherscanVerifier> {
        EtherscanVerifier::new(&self.config.etherscan, self.network.chain_id, self.artifacts())
    }

    /// Accounts of the network: its configured private keys, or the accounts
    /// unlocked on the node when none are configured.
    pub async fn accounts(&self) -> Result<Accounts> {
        let network = self.config.network_config(&self.network.name)?;

        if !network.accounts.is_empty() {
            return Accounts::from_private_keys(&network.accounts);
        }

        let accounts = self
            .rpc
            .accounts()
            .await
            .context("Failed to fetch the node accounts")?;
        Ok(Accounts::Node(accounts))
    }

    /// Run the scripts selected by `tags` and return the network's deployments.
    ///
    /// With `reset`, existing deployment records of the network are deleted first.
    pub async fn deploy(&self, tags: &[Tag], reset: bool) -> Result<Vec<DeploymentRecord>> {
        let plan = ScriptPlan::select(tags);
        tracing::info!(
            network = %self.network.name,
            chain_id = self.network.chain_id,
            scripts = ?plan.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "Starting deployment process..."
        );

        let store = DeploymentStore::open(&self.config.paths.deployments, &self.network.name)?;
        if reset {
            store.reset(self.network.chain_id)?;
        } else {
            store.ensure_chain_id(self.network.chain_id)?;
        }

        let accounts = self.accounts().await?;
        let named = &self.config.named_accounts;
        let first_account = accounts
            .get(named.first_account)
            .context("Failed to resolve the firstAccount named account")?;
        let second_account = accounts.get(named.second_account).ok();

        tracing::debug!(
            first_account = %first_account,
            second_account = ?second_account,
            "Named accounts"
        );

        let verifier = self.verifier()?;
        let mut deployments = ChainDeployments::new(
            self.rpc.clone(),
            self.network.clone(),
            accounts,
            self.artifacts(),
            store,
        );

        let mut ctx = DeployContext {
            network: &self.network,
            first_account,
            second_account,
            deployments: &mut deployments,
            verifier: &verifier,
        };
        plan.run(&mut ctx).await?;

        let records = deployments.store().list()?;

        tracing::info!("✓ Deployment complete!");
        for record in &records {
            tracing::info!("{:<20} {}", record.contract_name, record.address);
        }

        Ok(records)
    }

    /// Verify a recorded deployment on the block explorer.
    pub async fn verify_contract(&self, name: &str) -> Result<()> {
        let store = DeploymentStore::read_only(&self.config.paths.deployments, &self.network.name);
        let record = store.load(name)?.with_context(|| {
            format!(
                "No deployment found for: {} on network '{}'",
                name, self.network.name
            )
        })?;

        self.verifier()?
            .verify(&VerificationRequest {
                contract_name: record.contract_name,
                address: record.address,
                constructor_arguments: record.constructor_arguments,
            })
            .await
    }
}
