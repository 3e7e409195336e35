use alloy_core::primitives::Bytes;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Inputs that determine what a deployment puts on chain.
///
/// When any of these change, an existing deployment of the same contract can no
/// longer be reused and the contract is deployed again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInputs {
    /// Chain the contract is deployed to.
    pub chain_id: u64,
    /// Name of the contract artifact.
    pub contract_name: String,
    /// Creation bytecode from the artifact.
    pub bytecode: Bytes,
    /// ABI-encoded constructor arguments.
    pub constructor_arguments: Bytes,
}

impl DeploymentInputs {
    /// Compute a SHA-256 hash of these inputs.
    ///
    /// The hash is deterministic: the inputs are serialized to JSON in field
    /// declaration order before hashing.
    pub fn compute_hash(&self) -> Result<String> {
        let json = serde_json::to_string(self).context("Failed to serialize deployment inputs")?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let result = hasher.finalize();

        Ok(hex::encode(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> DeploymentInputs {
        DeploymentInputs {
            chain_id: 11155111,
            contract_name: "FundMe".to_string(),
            bytecode: Bytes::from(vec![0x60, 0x80, 0x60, 0x40]),
            constructor_arguments: Bytes::from(vec![0u8; 64]),
        }
    }

    #[test]
    fn test_hash_determinism() {
        let hash1 = inputs().compute_hash().unwrap();
        let hash2 = inputs().compute_hash().unwrap();

        assert_eq!(hash1, hash2, "Hash should be deterministic");
        assert_eq!(hash1.len(), 64, "SHA-256 hash should be 64 hex characters");
    }

    #[test]
    fn test_hash_changes_with_chain_id() {
        let mut other = inputs();
        other.chain_id = 97;

        assert_ne!(
            inputs().compute_hash().unwrap(),
            other.compute_hash().unwrap(),
            "Hash should change when chain_id changes"
        );
    }

    #[test]
    fn test_hash_changes_with_bytecode() {
        let mut other = inputs();
        other.bytecode = Bytes::from(vec![0x60, 0x80]);

        assert_ne!(
            inputs().compute_hash().unwrap(),
            other.compute_hash().unwrap(),
            "Hash should change when the bytecode changes"
        );
    }

    #[test]
    fn test_hash_changes_with_constructor_arguments() {
        let mut other = inputs();
        other.constructor_arguments = Bytes::from(vec![1u8; 64]);

        assert_ne!(
            inputs().compute_hash().unwrap(),
            other.compute_hash().unwrap(),
            "Hash should change when constructor arguments change"
        );
    }
}
