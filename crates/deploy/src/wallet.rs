//! Deployer accounts: local secp256k1 keys or accounts unlocked on the node.

use std::fmt;

use alloy_core::primitives::{Address, B256, U256, keccak256};
use anyhow::Context;
use k256::ecdsa::{SigningKey, VerifyingKey};

/// ECDSA signature over a transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    pub r: U256,
    pub s: U256,
    pub y_parity: bool,
}

/// Address derived from a public key: last 20 bytes of keccak256 over the
/// uncompressed point without its `0x04` marker.
pub fn public_key_address(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// A private key held by this process.
#[derive(Clone)]
pub struct LocalSigner {
    key: SigningKey,
    address: Address,
}

impl fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl LocalSigner {
    /// Create a signer from a 32-byte hex private key (with or without 0x prefix).
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, anyhow::Error> {
        let private_key_hex = private_key_hex.trim();
        let private_key_hex = private_key_hex
            .strip_prefix("0x")
            .unwrap_or(private_key_hex);

        let private_key_bytes: [u8; 32] = hex::decode(private_key_hex)
            .context("Private key is not valid hex")?
            .try_into()
            .map_err(|_| anyhow::anyhow!("Private key must be exactly 32 bytes"))?;

        let key = SigningKey::from_bytes(&private_key_bytes.into())
            .map_err(|e| anyhow::anyhow!("Invalid secp256k1 private key: {}", e))?;
        let address = public_key_address(key.verifying_key());

        Ok(Self { key, address })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte prehash.
    pub fn sign_hash(&self, hash: &B256) -> Result<TxSignature, anyhow::Error> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(hash.as_slice())
            .map_err(|e| anyhow::anyhow!("Failed to sign transaction hash: {}", e))?;

        let bytes = signature.to_bytes();
        Ok(TxSignature {
            r: U256::from_be_slice(&bytes[..32]),
            s: U256::from_be_slice(&bytes[32..]),
            y_parity: recovery_id.is_y_odd(),
        })
    }
}

/// Accounts available on a network.
#[derive(Debug, Clone)]
pub enum Accounts {
    /// Keys configured for the network; transactions are signed locally.
    Local(Vec<LocalSigner>),
    /// Accounts unlocked on the node (`eth_accounts`).
    Node(Vec<Address>),
}

impl Accounts {
    pub fn from_private_keys(keys: &[String]) -> Result<Self, anyhow::Error> {
        let signers = keys
            .iter()
            .enumerate()
            .map(|(index, key)| {
                LocalSigner::from_private_key(key)
                    .with_context(|| format!("Invalid private key for account {}", index))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::Local(signers))
    }

    pub fn addresses(&self) -> Vec<Address> {
        match self {
            Accounts::Local(signers) => signers.iter().map(LocalSigner::address).collect(),
            Accounts::Node(addresses) => addresses.clone(),
        }
    }

    /// Address of the account at `index`.
    pub fn get(&self, index: usize) -> Result<Address, anyhow::Error> {
        let addresses = self.addresses();
        addresses.get(index).copied().with_context(|| {
            format!(
                "No account at index {} ({} accounts available)",
                index,
                addresses.len()
            )
        })
    }

    /// The local signer for `address`, if this process holds its key.
    pub fn signer(&self, address: Address) -> Option<&LocalSigner> {
        match self {
            Accounts::Local(signers) => signers.iter().find(|s| s.address() == address),
            Accounts::Node(_) => None,
        }
    }

    pub fn contains(&self, address: Address) -> bool {
        self.addresses().contains(&address)
    }
}
