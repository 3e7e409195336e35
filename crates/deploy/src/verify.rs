//! Source verification against an Etherscan-compatible API.
//!
//! A submission (`verifysourcecode`) returns a GUID that is polled with
//! `checkverifystatus` until the explorer has compiled and matched the source.

use std::{fmt, future::Future, time::Duration};

use alloy_core::primitives::{Address, Bytes};
use anyhow::{Context, Result};
use backon::{ConstantBuilder, Retryable};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::{
    artifacts::{Artifact, ArtifactStore, BuildInfo},
    config::EtherscanConfig,
    network::SEPOLIA_CHAIN_ID,
};

/// Delay between two status checks.
const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(3);
/// Status checks before giving up.
const STATUS_MAX_POLLS: usize = 20;
/// Delay before resubmitting when the explorer has not indexed the bytecode yet.
const INDEXING_RETRY_INTERVAL: Duration = Duration::from_secs(5);
const INDEXING_MAX_RETRIES: usize = 6;

/// Whether a deployment on `chain_id` gets verified.
///
/// Only Sepolia deployments are verified, and only when an API key is set.
pub fn should_verify(chain_id: u64, api_key: Option<&str>) -> bool {
    chain_id == SEPOLIA_CHAIN_ID && api_key.is_some_and(|key| !key.trim().is_empty())
}

/// A deployed contract to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRequest {
    pub contract_name: String,
    pub address: Address,
    /// ABI-encoded constructor arguments.
    pub constructor_arguments: Bytes,
}

/// Publishes contract sources to a block explorer.
pub trait Verifier: Sync {
    /// The explorer API key, when one is configured.
    fn api_key(&self) -> Option<&str>;

    fn verify(&self, request: &VerificationRequest) -> impl Future<Output = Result<()>> + Send;
}

/// Raw explorer response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EtherscanResponse {
    pub status: String,
    pub message: String,
    pub result: Value,
}

impl EtherscanResponse {
    fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "1"
    }
}

/// Outcome of a `verifysourcecode` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Accepted; poll with this GUID.
    Queued(String),
    AlreadyVerified,
}

/// Result of a `checkverifystatus` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

/// The explorer has not indexed the contract's bytecode yet.
#[derive(Debug)]
struct BytecodeNotIndexed;

impl fmt::Display for BytecodeNotIndexed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the block explorer has not indexed the contract bytecode yet")
    }
}

impl std::error::Error for BytecodeNotIndexed {}

/// Verification is still queued.
#[derive(Debug)]
struct StillPending;

impl fmt::Display for StillPending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verification is still pending")
    }
}

impl std::error::Error for StillPending {}

fn is_already_verified(text: &str) -> bool {
    let text = text.to_lowercase();
    text.contains("already verified")
}

pub fn parse_submission(response: &EtherscanResponse) -> Result<Submission> {
    let text = response.result_text();

    if is_already_verified(&text) {
        return Ok(Submission::AlreadyVerified);
    }
    if !response.is_ok() {
        if text.contains("Unable to locate ContractCode") {
            return Err(BytecodeNotIndexed.into());
        }
        anyhow::bail!(
            "Verification submission rejected: {} ({})",
            text,
            response.message
        );
    }

    Ok(Submission::Queued(text))
}

pub fn parse_status(response: &EtherscanResponse) -> VerificationStatus {
    let text = response.result_text();

    if is_already_verified(&text) {
        VerificationStatus::AlreadyVerified
    } else if text.starts_with("Pending") {
        VerificationStatus::Pending
    } else if response.is_ok() && text.starts_with("Pass") {
        VerificationStatus::Verified
    } else {
        VerificationStatus::Failed(text)
    }
}

/// Form fields of a `verifysourcecode` submission.
pub fn submission_form(
    api_key: &str,
    request: &VerificationRequest,
    artifact: &Artifact,
    build_info: &BuildInfo,
) -> Result<Vec<(&'static str, String)>> {
    let source_code = serde_json::to_string(&build_info.input)
        .context("Failed to serialize the compiler input")?;

    Ok(vec![
        ("apikey", api_key.to_string()),
        ("module", "contract".to_string()),
        ("action", "verifysourcecode".to_string()),
        ("contractaddress", request.address.to_string()),
        ("sourceCode", source_code),
        ("codeformat", "solidity-standard-json-input".to_string()),
        ("contractname", artifact.fully_qualified_name()),
        (
            "compilerversion",
            format!("v{}", build_info.solc_long_version),
        ),
        // Misspelled on the explorer side.
        (
            "constructorArguements",
            hex::encode(&request.constructor_arguments),
        ),
    ])
}

/// [`Verifier`] talking to Etherscan (or any explorer exposing its API).
#[derive(Debug, Clone)]
pub struct EtherscanVerifier {
    client: reqwest::Client,
    api_url: Url,
    api_key: Option<String>,
    chain_id: u64,
    artifacts: ArtifactStore,
    poll_interval: Duration,
}

impl EtherscanVerifier {
    pub fn new(config: &EtherscanConfig, chain_id: u64, artifacts: ArtifactStore) -> Result<Self> {
        let api_url = Url::parse(&config.api_url)
            .with_context(|| format!("Invalid explorer API URL: {}", config.api_url))?;

        Ok(Self {
            client: crate::rpc::create_client()?,
            api_url,
            api_key: config.api_key().map(str::to_string),
            chain_id,
            artifacts,
            poll_interval: STATUS_POLL_INTERVAL,
        })
    }

    /// Override the delay between status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn endpoint(&self) -> Url {
        let mut url = self.api_url.clone();
        url.query_pairs_mut()
            .append_pair("chainid", &self.chain_id.to_string());
        url
    }

    fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .context("No explorer API key configured (set ETHERSCAN_API_KEY)")
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<EtherscanResponse> {
        let mut url = self.endpoint();
        url.query_pairs_mut().extend_pairs(params);

        self.client
            .get(url)
            .send()
            .await
            .context("Failed to reach the block explorer")?
            .json()
            .await
            .context("Failed to parse block explorer response")
    }

    /// Whether the explorer already has the source of `address`.
    pub async fn is_verified(&self, address: Address) -> Result<bool> {
        let api_key = self.require_api_key()?;
        let address = address.to_string();
        let response = self
            .get(&[
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", &address),
            ])
            .await?;

        if !response.is_ok() {
            return Ok(false);
        }

        Ok(response
            .result
            .get(0)
            .and_then(|entry| entry.get("SourceCode"))
            .and_then(Value::as_str)
            .is_some_and(|source| !source.is_empty()))
    }

    async fn submit(&self, form: &[(&'static str, String)]) -> Result<Submission> {
        let response: EtherscanResponse = self
            .client
            .post(self.endpoint())
            .form(form)
            .send()
            .await
            .context("Failed to send verification request")?
            .json()
            .await
            .context("Failed to parse verification response")?;

        tracing::debug!(status = %response.status, result = %response.result, "Verification submitted");
        parse_submission(&response)
    }

    async fn check_status(&self, guid: &str) -> Result<VerificationStatus> {
        let api_key = self.require_api_key()?;
        let response = self
            .get(&[
                ("apikey", api_key),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .await?;

        match parse_status(&response) {
            VerificationStatus::Pending => Err(StillPending.into()),
            status => Ok(status),
        }
    }
}

impl Verifier for EtherscanVerifier {
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    async fn verify(&self, request: &VerificationRequest) -> Result<()> {
        let api_key = self.require_api_key()?;
        let name = &request.contract_name;

        let verified = match self.is_verified(request.address).await {
            Ok(verified) => verified,
            Err(e) => {
                tracing::debug!(error = %e, contract = %name, "Source lookup failed, submitting anyway");
                false
            }
        };
        if verified {
            tracing::info!(contract = %name, address = %request.address, "Contract is already verified");
            return Ok(());
        }

        let artifact = self.artifacts.load(name)?;
        let build_info = self.artifacts.build_info(name)?;
        let form = submission_form(api_key, request, &artifact, &build_info)?;

        tracing::info!(
            contract = %artifact.fully_qualified_name(),
            address = %request.address,
            "Submitting source code for verification"
        );

        let submission = (|| self.submit(&form))
            .retry(
                ConstantBuilder::default()
                    .with_delay(INDEXING_RETRY_INTERVAL)
                    .with_max_times(INDEXING_MAX_RETRIES),
            )
            .sleep(tokio::time::sleep)
            .when(|e: &anyhow::Error| e.is::<BytecodeNotIndexed>())
            .notify(|_, delay| {
                tracing::debug!(?delay, "Bytecode not indexed by the explorer yet, retrying");
            })
            .await?;

        let guid = match submission {
            Submission::AlreadyVerified => {
                tracing::info!(contract = %name, "Contract is already verified");
                return Ok(());
            }
            Submission::Queued(guid) => guid,
        };

        let status = (|| self.check_status(&guid))
            .retry(
                ConstantBuilder::default()
                    .with_delay(self.poll_interval)
                    .with_max_times(STATUS_MAX_POLLS),
            )
            .sleep(tokio::time::sleep)
            .when(|e: &anyhow::Error| e.is::<StillPending>())
            .await
            .with_context(|| format!("Verification of {} did not complete", name))?;

        match status {
            VerificationStatus::Verified => {
                tracing::info!(contract = %name, address = %request.address, "Successfully verified contract");
                Ok(())
            }
            VerificationStatus::AlreadyVerified => {
                tracing::info!(contract = %name, "Contract is already verified");
                Ok(())
            }
            VerificationStatus::Failed(reason) => {
                anyhow::bail!("Verification of {} failed: {}", name, reason)
            }
            VerificationStatus::Pending => {
                anyhow::bail!("Verification of {} is still pending", name)
            }
        }
    }
}
