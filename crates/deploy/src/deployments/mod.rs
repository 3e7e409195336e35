//! Deployment records and the deploy/get operations available to deploy scripts.
//!
//! [`ChainDeployments`] is the implementation that talks to a node; the
//! [`Deployments`] trait is the seam deploy scripts are written against.

mod chain;
mod hash;
mod store;

use std::future::Future;

use alloy_core::{
    dyn_abi::DynSolValue,
    primitives::{Address, B256, Bytes},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use chain::ChainDeployments;
pub use hash::DeploymentInputs;
pub use store::DeploymentStore;

/// How a contract should be deployed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeployOptions {
    /// Account sending the creation transaction.
    pub from: Address,
    /// Constructor arguments.
    pub args: Vec<DynSolValue>,
    /// Log the transaction and the resulting address at info level.
    pub log: bool,
    /// Block confirmations to wait for after the receipt.
    pub wait_confirmations: u64,
}

/// A deployed contract, persisted per network under the contract name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    pub contract_name: String,
    pub address: Address,
    /// Constructor arguments in display form.
    pub args: Vec<Value>,
    /// ABI-encoded constructor arguments, as submitted for verification.
    pub constructor_arguments: Bytes,
    pub deployer: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    /// See [`DeploymentInputs::compute_hash`].
    pub deployment_hash: String,
    /// Unix timestamp of the deployment.
    pub deployed_at: i64,
    pub abi: Value,
}

/// Deploy and look up contracts on the active network.
pub trait Deployments: Send {
    /// Deploy `name` (or reuse an identical earlier deployment) and record it.
    fn deploy(
        &mut self,
        name: &str,
        options: DeployOptions,
    ) -> impl Future<Output = Result<DeploymentRecord>> + Send;

    /// The recorded deployment of `name`.
    fn get(&self, name: &str) -> Result<DeploymentRecord>;
}

/// ABI-encode constructor arguments.
pub fn encode_constructor_args(args: &[DynSolValue]) -> Bytes {
    if args.is_empty() {
        return Bytes::new();
    }
    DynSolValue::Tuple(args.to_vec()).abi_encode_params().into()
}

/// Human readable constructor arguments, as stored in deployment records.
pub fn display_args(args: &[DynSolValue]) -> Vec<Value> {
    args.iter().map(display_arg).collect()
}

fn display_arg(arg: &DynSolValue) -> Value {
    match arg {
        DynSolValue::Address(address) => Value::String(address.to_string()),
        DynSolValue::Uint(value, _) => Value::String(value.to_string()),
        DynSolValue::Int(value, _) => Value::String(value.to_string()),
        DynSolValue::Bool(value) => Value::Bool(*value),
        DynSolValue::String(value) => Value::String(value.clone()),
        DynSolValue::Array(values) | DynSolValue::FixedArray(values) | DynSolValue::Tuple(values) => {
            Value::Array(values.iter().map(display_arg).collect())
        }
        other => Value::String(format!("{:?}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_core::primitives::{I256, U256};

    fn feed() -> Address {
        "0x694AA1769357215DE4FAC081bf1f309aDC325306".parse().unwrap()
    }

    #[test]
    fn test_encode_fund_me_args() {
        let encoded = encode_constructor_args(&[
            DynSolValue::Uint(U256::from(180), 256),
            DynSolValue::Address(feed()),
        ]);

        assert_eq!(
            hex::encode(&encoded),
            concat!(
                "00000000000000000000000000000000000000000000000000000000000000b4",
                "000000000000000000000000694aa1769357215de4fac081bf1f309adc325306"
            )
        );
    }

    #[test]
    fn test_encode_mock_args() {
        let encoded = encode_constructor_args(&[
            DynSolValue::Uint(U256::from(8), 8),
            DynSolValue::Int(I256::try_from(300_000_000_000i64).unwrap(), 256),
        ]);

        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 8);
        assert_eq!(&encoded[59..64], &[0x45, 0xd9, 0x64, 0xb8, 0x00]);
    }

    #[test]
    fn test_encode_no_args() {
        assert!(encode_constructor_args(&[]).is_empty());
    }

    #[test]
    fn test_display_args() {
        let args = display_args(&[
            DynSolValue::Uint(U256::from(180), 256),
            DynSolValue::Address(feed()),
            DynSolValue::Int(I256::try_from(-5i64).unwrap(), 256),
        ]);

        assert_eq!(
            args,
            vec![
                Value::String("180".to_string()),
                Value::String("0x694AA1769357215DE4FAC081bf1f309aDC325306".to_string()),
                Value::String("-5".to_string()),
            ]
        );
    }
}
