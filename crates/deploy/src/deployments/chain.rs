use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::{Context, Result};

use super::{
    DeployOptions, DeploymentInputs, DeploymentRecord, DeploymentStore, Deployments, display_args,
    encode_constructor_args,
};
use crate::{
    artifacts::ArtifactStore, network::Network, rpc::RpcClient, transaction::LegacyTransaction,
    wallet::Accounts,
};

/// [`Deployments`] backed by a JSON-RPC node and the on-disk deployment store.
#[derive(Debug)]
pub struct ChainDeployments {
    rpc: RpcClient,
    network: Network,
    accounts: Accounts,
    artifacts: ArtifactStore,
    store: DeploymentStore,
}

impl ChainDeployments {
    pub fn new(
        rpc: RpcClient,
        network: Network,
        accounts: Accounts,
        artifacts: ArtifactStore,
        store: DeploymentStore,
    ) -> Self {
        Self {
            rpc,
            network,
            accounts,
            artifacts,
            store,
        }
    }

    pub fn store(&self) -> &DeploymentStore {
        &self.store
    }

    /// An earlier deployment that can stand in for this one: same inputs and
    /// code still present at its address.
    async fn reusable(&self, name: &str, hash: &str) -> Result<Option<DeploymentRecord>> {
        let Some(record) = self.store.load(name)? else {
            return Ok(None);
        };

        if record.deployment_hash != hash {
            tracing::debug!(contract = %name, "Deployment inputs changed, redeploying");
            return Ok(None);
        }

        let code = self
            .rpc
            .code_at(record.address)
            .await
            .with_context(|| format!("Failed to fetch code of {} at {}", name, record.address))?;
        if code.is_empty() {
            tracing::debug!(contract = %name, address = %record.address, "No code at recorded address, redeploying");
            return Ok(None);
        }

        Ok(Some(record))
    }

    /// Send the creation transaction and return its hash.
    async fn send_creation(&self, from: Address, init_code: Bytes) -> Result<B256> {
        if !self.accounts.contains(from) {
            anyhow::bail!(
                "Account {} is not available on network '{}'",
                from,
                self.network.name
            );
        }

        let Some(signer) = self.accounts.signer(from) else {
            return self
                .rpc
                .send_creation(from, &init_code)
                .await
                .context("Failed to send creation transaction");
        };

        let nonce = self
            .rpc
            .transaction_count(from)
            .await
            .context("Failed to fetch nonce")?;
        let gas_price = self
            .rpc
            .gas_price()
            .await
            .context("Failed to fetch gas price")?;
        let gas_limit = self
            .rpc
            .estimate_creation_gas(from, &init_code)
            .await
            .context("Failed to estimate deployment gas")?;

        tracing::debug!(nonce, gas_price, gas_limit, "Signing creation transaction");

        let tx = LegacyTransaction::creation(
            self.network.chain_id,
            nonce,
            gas_price,
            gas_limit,
            init_code,
        );
        let (hash, raw) = tx.sign(signer)?;

        let sent = self
            .rpc
            .send_raw_transaction(&raw)
            .await
            .context("Failed to send raw creation transaction")?;
        if sent != hash {
            tracing::warn!(expected = %hash, returned = %sent, "Node returned an unexpected transaction hash");
        }

        Ok(sent)
    }
}

impl Deployments for ChainDeployments {
    async fn deploy(&mut self, name: &str, options: DeployOptions) -> Result<DeploymentRecord> {
        let artifact = self.artifacts.load(name)?;
        let constructor_arguments = encode_constructor_args(&options.args);

        let deployment_hash = DeploymentInputs {
            chain_id: self.network.chain_id,
            contract_name: artifact.contract_name.clone(),
            bytecode: artifact.bytecode.clone(),
            constructor_arguments: constructor_arguments.clone(),
        }
        .compute_hash()?;

        if let Some(record) = self.reusable(name, &deployment_hash).await? {
            if options.log {
                tracing::info!("reusing \"{}\" at {}", name, record.address);
            }
            return Ok(record);
        }

        if artifact.bytecode.is_empty() {
            anyhow::bail!("Artifact of '{}' has no bytecode (abstract contract or interface?)", name);
        }

        let mut init_code = artifact.bytecode.to_vec();
        init_code.extend_from_slice(&constructor_arguments);

        let tx_hash = self.send_creation(options.from, init_code.into()).await?;
        if options.log {
            tracing::info!("deploying \"{}\" (tx: {})...", name, tx_hash);
        }

        let receipt = self
            .rpc
            .wait_for_receipt(tx_hash, self.network.timeout, self.network.poll_interval())
            .await
            .with_context(|| format!("Failed to get the receipt of {} deployment", name))?;

        if !receipt.succeeded() {
            anyhow::bail!("Deployment of {} reverted (tx: {})", name, tx_hash);
        }
        let address = receipt
            .contract_address
            .with_context(|| format!("Receipt of {} deployment has no contract address", name))?;

        if options.wait_confirmations > 0 {
            tracing::debug!(
                contract = %name,
                confirmations = options.wait_confirmations,
                "Waiting for confirmations"
            );
        }
        self.rpc
            .wait_for_confirmations(
                receipt.block_number,
                options.wait_confirmations,
                self.network.is_development(),
                self.network.timeout * options.wait_confirmations.max(1) as u32,
                self.network.poll_interval(),
            )
            .await
            .with_context(|| format!("Failed to confirm {} deployment", name))?;

        let record = DeploymentRecord {
            contract_name: name.to_string(),
            address,
            args: display_args(&options.args),
            constructor_arguments,
            deployer: options.from,
            transaction_hash: Some(tx_hash),
            block_number: Some(receipt.block_number),
            gas_used: Some(receipt.gas_used),
            deployment_hash,
            deployed_at: chrono::Utc::now().timestamp(),
            abi: artifact.abi,
        };
        self.store.save(&record)?;

        if options.log {
            tracing::info!("deployed at {} with {} gas", address, receipt.gas_used);
        }

        Ok(record)
    }

    fn get(&self, name: &str) -> Result<DeploymentRecord> {
        self.store.load(name)?.with_context(|| {
            format!(
                "No deployment found for: {} on network '{}'",
                name, self.network.name
            )
        })
    }
}
