//! Pipeline tests for fundme-deploy.
//!
//! The deploy scripts run against recording fakes of [`Deployments`] and
//! [`Verifier`], so no node or block explorer is needed.
//! Run with: cargo test --test pipeline_test

use std::{collections::HashMap, sync::Mutex, time::Duration};

use alloy_core::primitives::{Address, Bytes, address};
use anyhow::{Context, Result};
use fundme_deploy::{
    DeployContext, DeployOptions, DeploymentRecord, Deployments, Network, NetworkError,
    ScriptPlan, Tag, VerificationRequest, Verifier,
    deployments::{display_args, encode_constructor_args},
    network::{BNB_TESTNET_CHAIN_ID, CONFIRMATIONS, DEVELOPMENT_CHAIN_ID, SEPOLIA_CHAIN_ID},
    scripts::{FUND_ME, MOCK_V3_AGGREGATOR, fund_me_args, mock_feed_args},
};
use rand::Rng;
use url::Url;

const SEPOLIA_FEED: Address = address!("694AA1769357215DE4FAC081bf1f309aDC325306");
const BNB_TESTNET_FEED: Address = address!("143db3CEEfbdfe5631aDD3E50f7614B6ba708BA7");

/// Records every deploy call and hands out sequential addresses.
#[derive(Debug, Default)]
struct RecordingDeployments {
    calls: Vec<(String, DeployOptions)>,
    records: HashMap<String, DeploymentRecord>,
}

impl Deployments for RecordingDeployments {
    async fn deploy(&mut self, name: &str, options: DeployOptions) -> Result<DeploymentRecord> {
        let index = self.calls.len() as u8 + 1;
        let record = DeploymentRecord {
            contract_name: name.to_string(),
            address: Address::repeat_byte(index),
            args: display_args(&options.args),
            constructor_arguments: encode_constructor_args(&options.args),
            deployer: options.from,
            transaction_hash: None,
            block_number: Some(index as u64),
            gas_used: None,
            deployment_hash: String::new(),
            deployed_at: 0,
            abi: serde_json::json!([]),
        };

        self.calls.push((name.to_string(), options));
        self.records.insert(name.to_string(), record.clone());
        Ok(record)
    }

    fn get(&self, name: &str) -> Result<DeploymentRecord> {
        self.records
            .get(name)
            .cloned()
            .with_context(|| format!("No deployment found for: {}", name))
    }
}

/// Records verification requests.
#[derive(Debug, Default)]
struct RecordingVerifier {
    api_key: Option<String>,
    requests: Mutex<Vec<VerificationRequest>>,
}

impl RecordingVerifier {
    fn with_key(key: &str) -> Self {
        Self {
            api_key: Some(key.to_string()),
            requests: Mutex::default(),
        }
    }

    fn requests(&self) -> Vec<VerificationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Verifier for RecordingVerifier {
    fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    async fn verify(&self, request: &VerificationRequest) -> Result<()> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }
}

/// Outcome of a pipeline run.
struct Run {
    result: Result<()>,
    deployments: RecordingDeployments,
    verified: Vec<VerificationRequest>,
}

impl Run {
    fn deployed_names(&self) -> Vec<&str> {
        self.deployments
            .calls
            .iter()
            .map(|(name, _)| name.as_str())
            .collect()
    }

    fn options(&self, name: &str) -> &DeployOptions {
        self.deployments
            .calls
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, options)| options)
            .unwrap()
    }
}

fn deployer_account() -> Address {
    address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
}

fn network(name: &str, chain_id: u64) -> Network {
    Network {
        name: name.to_string(),
        chain_id,
        url: Url::parse("http://127.0.0.1:8545").unwrap(),
        timeout: Duration::from_secs(1),
    }
}

async fn run_pipeline(network: Network, tags: &[Tag], verifier: RecordingVerifier) -> Run {
    let mut deployments = RecordingDeployments::default();

    let result = {
        let mut ctx = DeployContext {
            network: &network,
            first_account: deployer_account(),
            second_account: None,
            deployments: &mut deployments,
            verifier: &verifier,
        };
        ScriptPlan::select(tags).run(&mut ctx).await
    };

    Run {
        result,
        deployments,
        verified: verifier.requests(),
    }
}

/// A chain ID absent from the network table.
///
/// Range: 100000-999999, clear of the development, BNB testnet and Sepolia chain IDs.
fn random_unknown_chain_id() -> u64 {
    rand::rng().random_range(100000..=999999)
}

#[tokio::test]
async fn test_development_networks_deploy_mock_then_fund_me() {
    for name in ["hardhat", "local"] {
        let run = run_pipeline(
            network(name, DEVELOPMENT_CHAIN_ID),
            &[Tag::All],
            RecordingVerifier::with_key("KEY"),
        )
        .await;

        run.result.as_ref().unwrap();
        assert_eq!(run.deployed_names(), vec![MOCK_V3_AGGREGATOR, FUND_ME]);

        let mock = run.options(MOCK_V3_AGGREGATOR);
        assert_eq!(mock.from, deployer_account());
        assert_eq!(mock.args, mock_feed_args().unwrap());
        assert_eq!(mock.wait_confirmations, CONFIRMATIONS);
        assert!(mock.log);

        // FundMe reads the mock deployed just before.
        let mock_address = run.deployments.get(MOCK_V3_AGGREGATOR).unwrap().address;
        let fund_me = run.options(FUND_ME);
        assert_eq!(fund_me.args, fund_me_args(mock_address));
        assert_eq!(fund_me.wait_confirmations, 0);

        assert!(run.verified.is_empty());
    }
}

#[tokio::test]
async fn test_sepolia_uses_static_feed_and_verifies() {
    let run = run_pipeline(
        network("sepolia", SEPOLIA_CHAIN_ID),
        &[Tag::All],
        RecordingVerifier::with_key("KEY"),
    )
    .await;

    run.result.as_ref().unwrap();
    assert_eq!(run.deployed_names(), vec![FUND_ME]);

    let fund_me = run.options(FUND_ME);
    assert_eq!(fund_me.args, fund_me_args(SEPOLIA_FEED));
    assert_eq!(fund_me.wait_confirmations, CONFIRMATIONS);

    let record = run.deployments.get(FUND_ME).unwrap();
    assert_eq!(
        run.verified,
        vec![VerificationRequest {
            contract_name: FUND_ME.to_string(),
            address: record.address,
            constructor_arguments: encode_constructor_args(&fund_me_args(SEPOLIA_FEED)),
        }]
    );
}

#[tokio::test]
async fn test_sepolia_without_api_key_skips_verification() {
    for verifier in [
        RecordingVerifier::default(),
        RecordingVerifier::with_key(""),
    ] {
        let run = run_pipeline(network("sepolia", SEPOLIA_CHAIN_ID), &[], verifier).await;

        run.result.as_ref().unwrap();
        assert_eq!(run.deployed_names(), vec![FUND_ME]);
        assert!(run.verified.is_empty());
    }
}

#[tokio::test]
async fn test_bnb_testnet_uses_its_feed_without_verification() {
    let run = run_pipeline(
        network("bnbtest", BNB_TESTNET_CHAIN_ID),
        &[Tag::All],
        RecordingVerifier::with_key("KEY"),
    )
    .await;

    run.result.as_ref().unwrap();
    assert_eq!(run.deployed_names(), vec![FUND_ME]);

    let fund_me = run.options(FUND_ME);
    assert_eq!(fund_me.args, fund_me_args(BNB_TESTNET_FEED));
    assert_eq!(fund_me.wait_confirmations, CONFIRMATIONS);
    assert!(run.verified.is_empty());
}

#[tokio::test]
async fn test_unknown_chain_fails_before_deploying() {
    let chain_id = random_unknown_chain_id();
    let run = run_pipeline(
        network("mystery", chain_id),
        &[Tag::All],
        RecordingVerifier::with_key("KEY"),
    )
    .await;

    let err = run.result.as_ref().unwrap_err();
    assert_eq!(
        err.downcast_ref::<NetworkError>(),
        Some(&NetworkError::MissingNetworkConfig { chain_id })
    );
    assert!(run.deployed_names().is_empty());
    assert!(run.verified.is_empty());
}

#[tokio::test]
async fn test_mocks_tag_only_deploys_the_mock() {
    let run = run_pipeline(
        network("local", DEVELOPMENT_CHAIN_ID),
        &[Tag::Mocks],
        RecordingVerifier::default(),
    )
    .await;
    run.result.as_ref().unwrap();
    assert_eq!(run.deployed_names(), vec![MOCK_V3_AGGREGATOR]);

    let run = run_on_sepolia_with_tags(&[Tag::Mocks]).await;
    run.result.as_ref().unwrap();
    assert!(run.deployed_names().is_empty());
}

#[tokio::test]
async fn test_fund_me_tag_pulls_in_the_mock() {
    let run = run_pipeline(
        network("hardhat", DEVELOPMENT_CHAIN_ID),
        &[Tag::Fundmd],
        RecordingVerifier::default(),
    )
    .await;

    run.result.as_ref().unwrap();
    assert_eq!(run.deployed_names(), vec![MOCK_V3_AGGREGATOR, FUND_ME]);
}

#[tokio::test]
async fn test_mock_is_not_deployed_on_live_networks() {
    for (name, chain_id) in [
        ("sepolia", SEPOLIA_CHAIN_ID),
        ("bnbtest", BNB_TESTNET_CHAIN_ID),
    ] {
        let run = run_pipeline(
            network(name, chain_id),
            &[Tag::All],
            RecordingVerifier::default(),
        )
        .await;
        run.result.as_ref().unwrap();
        assert!(!run.deployed_names().contains(&MOCK_V3_AGGREGATOR));
    }
}

async fn run_on_sepolia_with_tags(tags: &[Tag]) -> Run {
    run_pipeline(
        network("sepolia", SEPOLIA_CHAIN_ID),
        tags,
        RecordingVerifier::with_key("KEY"),
    )
    .await
}

#[test]
fn test_constructor_arguments_encoding() {
    let encoded = encode_constructor_args(&fund_me_args(SEPOLIA_FEED));
    assert_eq!(
        encoded,
        Bytes::from(
            hex::decode(concat!(
                "00000000000000000000000000000000000000000000000000000000000000b4",
                "000000000000000000000000694aa1769357215de4fac081bf1f309adc325306"
            ))
            .unwrap()
        )
    );
}
