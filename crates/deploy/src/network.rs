//! Network selection and the static per-chain configuration table.
//!
//! The table answers one question for live networks: which price feed should the
//! `FundMe` contract read from? Development networks get their feed from the
//! `MockV3Aggregator` deployment instead.

use std::{fmt, time::Duration};

use alloy_core::primitives::{Address, address};
use url::Url;

/// Decimals reported by the mock price feed.
pub const DECIMALS: u8 = 8;
/// Initial answer reported by the mock price feed (3000 USD with 8 decimals).
pub const INITIAL_ANSWER: i64 = 300_000_000_000;
/// Funding window of the `FundMe` contract, in seconds.
pub const LOCK_TIME: u64 = 180;
/// Confirmations awaited on live networks.
pub const CONFIRMATIONS: u64 = 5;

pub const SEPOLIA_CHAIN_ID: u64 = 11155111;
pub const BNB_TESTNET_CHAIN_ID: u64 = 97;
/// Chain ID used by hardhat and anvil nodes.
pub const DEVELOPMENT_CHAIN_ID: u64 = 31337;

/// Names of the locally simulated networks.
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "local"];

/// Per-chain configuration entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkEntry {
    /// Human readable chain name, when one is known.
    pub name: Option<&'static str>,
    /// ETH/USD price feed deployed on that chain.
    pub feed_address: Address,
}

/// Static chain ID to network table.
pub const NETWORK_CONFIG: &[(u64, NetworkEntry)] = &[
    (
        SEPOLIA_CHAIN_ID,
        NetworkEntry {
            name: Some("sepolia"),
            feed_address: address!("694AA1769357215DE4FAC081bf1f309aDC325306"),
        },
    ),
    (
        BNB_TESTNET_CHAIN_ID,
        NetworkEntry {
            name: None,
            feed_address: address!("143db3CEEfbdfe5631aDD3E50f7614B6ba708BA7"),
        },
    ),
];

/// Errors raised by lookups in [`NETWORK_CONFIG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkError {
    /// The chain is neither a development network nor listed in the table.
    MissingNetworkConfig { chain_id: u64 },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::MissingNetworkConfig { chain_id } => write!(
                f,
                "No network configuration for chain ID {chain_id}: add an entry with its price feed address"
            ),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Whether `name` designates a locally simulated network.
pub fn is_development(name: &str) -> bool {
    DEVELOPMENT_CHAINS.contains(&name)
}

/// Look up the table entry for a chain.
pub fn network_entry(chain_id: u64) -> Result<&'static NetworkEntry, NetworkError> {
    NETWORK_CONFIG
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, entry)| entry)
        .ok_or(NetworkError::MissingNetworkConfig { chain_id })
}

/// The price feed address configured for a live chain.
pub fn feed_address(chain_id: u64) -> Result<Address, NetworkError> {
    network_entry(chain_id).map(|entry| entry.feed_address)
}

/// Where the `FundMe` price feed comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSource {
    /// The address recorded for the `MockV3Aggregator` deployment.
    Mock,
    /// A feed already deployed on chain.
    Static(Address),
}

/// Feed source and confirmation depth for a `FundMe` deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPlan {
    pub source: FeedSource,
    pub confirmations: u64,
}

/// Resolve the feed and confirmation depth for the given network.
///
/// Fails with [`NetworkError::MissingNetworkConfig`] before anything is sent
/// when a live chain has no table entry.
pub fn resolve_feed(network_name: &str, chain_id: u64) -> Result<FeedPlan, NetworkError> {
    if is_development(network_name) {
        return Ok(FeedPlan {
            source: FeedSource::Mock,
            confirmations: 0,
        });
    }

    Ok(FeedPlan {
        source: FeedSource::Static(feed_address(chain_id)?),
        confirmations: CONFIRMATIONS,
    })
}

/// The network a pipeline runs against, once resolved from the project configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub chain_id: u64,
    pub url: Url,
    /// Upper bound for a single wait on the node (receipt, one confirmation).
    pub timeout: Duration,
}

impl Network {
    pub fn is_development(&self) -> bool {
        is_development(&self.name)
    }

    /// Interval between two polls of the node.
    pub fn poll_interval(&self) -> Duration {
        if self.is_development() {
            Duration::from_millis(200)
        } else {
            Duration::from_secs(2)
        }
    }
}
