//! Shared RPC utilities for interacting with Ethereum JSON-RPC endpoints.

use std::{future::Future, time::Duration};

use alloy_core::primitives::{Address, B256, Bytes};
use anyhow::Context;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use url::Url;

/// Default timeout for RPC requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Create an HTTP client configured for JSON-RPC requests.
pub fn create_client() -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")
}

/// Make a JSON-RPC call and deserialize the result.
///
/// # Arguments
/// * `client` - The HTTP client to use
/// * `url` - The RPC endpoint URL
/// * `method` - The RPC method name
/// * `params` - The method parameters
///
/// # Returns
/// The deserialized result, or an error if the request failed or returned an error response.
pub async fn json_rpc_call<T: DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    method: &str,
    params: Vec<Value>,
) -> Result<T, anyhow::Error> {
    let response = client
        .post(url)
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .send()
        .await
        .with_context(|| format!("Failed to send {} request", method))?;

    let result: Value = response
        .json()
        .await
        .with_context(|| format!("Failed to parse {} response", method))?;

    if let Some(error) = result.get("error") {
        anyhow::bail!(
            "RPC error: {}",
            error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
        );
    }

    let result_value = result
        .get("result")
        .context("No result in response")?
        .clone();

    serde_json::from_value(result_value)
        .with_context(|| format!("Failed to deserialize {} result", method))
}

/// Poll `check_fn` until it yields a value.
///
/// `Ok(None)` and errors both mean "not yet"; errors are logged at trace level.
///
/// # Arguments
/// * `name` - What is being waited for (for error messages)
/// * `timeout` - Maximum time to wait
/// * `interval` - Delay between two attempts
/// * `check_fn` - Function returning `Ok(Some(_))` once the condition holds
pub async fn poll_until<T, F, Fut>(
    name: &str,
    timeout: Duration,
    interval: Duration,
    mut check_fn: F,
) -> Result<T, anyhow::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, anyhow::Error>>,
{
    let start = std::time::Instant::now();

    loop {
        match check_fn().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => {
                tracing::trace!(error = %e, waiting_for = %name, "Poll failed, retrying...");
            }
        }

        if start.elapsed() > timeout {
            anyhow::bail!("Timeout waiting for {}", name);
        }

        tokio::time::sleep(interval).await;
    }
}

/// Parse a JSON-RPC quantity (`0x`-prefixed hex).
pub fn parse_quantity(value: &str) -> Result<u128, anyhow::Error> {
    let digits = value
        .strip_prefix("0x")
        .with_context(|| format!("Quantity is not 0x-prefixed: {}", value))?;
    if digits.is_empty() {
        anyhow::bail!("Empty quantity");
    }
    u128::from_str_radix(digits, 16).with_context(|| format!("Invalid quantity: {}", value))
}

/// Deserialize a u64 from a hex string (with 0x prefix).
fn deserialize_u64_from_hex<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    let value = parse_quantity(&s).map_err(serde::de::Error::custom)?;
    u64::try_from(value).map_err(serde::de::Error::custom)
}

/// The fields of a transaction receipt this crate needs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub block_number: u64,
    #[serde(deserialize_with = "deserialize_u64_from_hex")]
    pub gas_used: u64,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// `0x1` on success, `0x0` on revert. Absent on pre-byzantium chains.
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }
}

/// Typed JSON-RPC client bound to one endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    client: reqwest::Client,
    url: Url,
}

impl RpcClient {
    pub fn new(url: Url) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: create_client()?,
            url,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, anyhow::Error> {
        json_rpc_call(&self.client, self.url.as_str(), method, params).await
    }

    async fn quantity(&self, method: &str, params: Vec<Value>) -> Result<u128, anyhow::Error> {
        let value: String = self.call(method, params).await?;
        parse_quantity(&value)
    }

    pub async fn chain_id(&self) -> Result<u64, anyhow::Error> {
        let chain_id = self.quantity("eth_chainId", vec![]).await?;
        u64::try_from(chain_id).context("Chain ID does not fit in u64")
    }

    pub async fn block_number(&self) -> Result<u64, anyhow::Error> {
        let number = self.quantity("eth_blockNumber", vec![]).await?;
        u64::try_from(number).context("Block number does not fit in u64")
    }

    /// Accounts managed by the node.
    pub async fn accounts(&self) -> Result<Vec<Address>, anyhow::Error> {
        self.call("eth_accounts", vec![]).await
    }

    pub async fn gas_price(&self) -> Result<u128, anyhow::Error> {
        self.quantity("eth_gasPrice", vec![]).await
    }

    /// Pending nonce of `address`.
    pub async fn transaction_count(&self, address: Address) -> Result<u64, anyhow::Error> {
        let nonce = self
            .quantity(
                "eth_getTransactionCount",
                vec![serde_json::json!(address), serde_json::json!("pending")],
            )
            .await?;
        u64::try_from(nonce).context("Nonce does not fit in u64")
    }

    /// Gas estimate for a contract creation sent by `from`.
    pub async fn estimate_creation_gas(
        &self,
        from: Address,
        data: &Bytes,
    ) -> Result<u64, anyhow::Error> {
        let gas = self
            .quantity(
                "eth_estimateGas",
                vec![serde_json::json!({ "from": from, "data": data })],
            )
            .await?;
        u64::try_from(gas).context("Gas estimate does not fit in u64")
    }

    /// Deployed code at `address` (`0x` when there is none).
    pub async fn code_at(&self, address: Address) -> Result<Bytes, anyhow::Error> {
        self.call(
            "eth_getCode",
            vec![serde_json::json!(address), serde_json::json!("latest")],
        )
        .await
    }

    /// Send a contract creation from an account unlocked on the node.
    pub async fn send_creation(&self, from: Address, data: &Bytes) -> Result<B256, anyhow::Error> {
        self.call(
            "eth_sendTransaction",
            vec![serde_json::json!({ "from": from, "data": data })],
        )
        .await
    }

    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256, anyhow::Error> {
        self.call("eth_sendRawTransaction", vec![serde_json::json!(raw)])
            .await
    }

    pub async fn transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, anyhow::Error> {
        self.call("eth_getTransactionReceipt", vec![serde_json::json!(hash)])
            .await
    }

    /// Mine one block. Only development nodes (hardhat, anvil) support this.
    pub async fn mine_block(&self) -> Result<(), anyhow::Error> {
        let _: Value = self.call("evm_mine", vec![]).await?;
        Ok(())
    }

    /// Wait for the receipt of `hash`.
    pub async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
        interval: Duration,
    ) -> Result<TransactionReceipt, anyhow::Error> {
        poll_until(&format!("receipt of {}", hash), timeout, interval, || {
            self.transaction_receipt(hash)
        })
        .await
    }

    /// Wait until the block `block_number` has `confirmations` confirmations, the
    /// block itself counting as the first one.
    ///
    /// With `mine` set, missing blocks are mined instead of awaited.
    pub async fn wait_for_confirmations(
        &self,
        block_number: u64,
        confirmations: u64,
        mine: bool,
        timeout: Duration,
        interval: Duration,
    ) -> Result<(), anyhow::Error> {
        if confirmations <= 1 {
            return Ok(());
        }

        let target = block_number + confirmations - 1;

        if mine {
            let latest = self.block_number().await?;
            for _ in latest..target {
                self.mine_block().await.context("Failed to mine block")?;
            }
        }

        poll_until(
            &format!("{} confirmations of block {}", confirmations, block_number),
            timeout,
            interval,
            || async move {
                let latest = self.block_number().await?;
                tracing::debug!(latest, target, "Waiting for confirmations");
                Ok::<_, anyhow::Error>((latest >= target).then_some(()))
            },
        )
        .await
    }
}
