//! fundme-deploy - Deployment pipeline for the FundMe contract.
//!
//! This crate deploys a `MockV3Aggregator` price feed on development networks,
//! then `FundMe` wired to the network's price feed, and verifies the source on
//! the block explorer when deploying to Sepolia.

pub mod artifacts;
mod builder;
pub mod config;
mod deployer;
pub mod deployments;
mod fs;
pub mod network;
pub mod report;
pub mod rpc;
pub mod scripts;
pub mod transaction;
pub mod verify;
pub mod wallet;

pub use builder::DeployerBuilder;
pub use config::{CONFIG_FILENAME, ProjectConfig};
pub use deployer::Deployer;
pub use deployments::{DeployOptions, DeploymentRecord, DeploymentStore, Deployments};
pub use network::{Network, NetworkError};
pub use scripts::{DeployContext, ScriptPlan, Tag};
pub use verify::{VerificationRequest, Verifier};
