//! EIP-155 legacy transactions signed with a [`LocalSigner`].

use alloy_core::{
    primitives::{Address, B256, Bytes, U256, keccak256},
    rlp::{BufMut, EMPTY_STRING_CODE, Encodable, Header},
};

use crate::wallet::{LocalSigner, TxSignature};

/// A legacy (type 0) transaction with replay protection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// `None` for contract creations.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
}

impl LegacyTransaction {
    /// A contract creation carrying `init_code` (bytecode followed by constructor arguments).
    pub fn creation(
        chain_id: u64,
        nonce: u64,
        gas_price: u128,
        gas_limit: u64,
        init_code: Bytes,
    ) -> Self {
        Self {
            chain_id,
            nonce,
            gas_price,
            gas_limit,
            to: None,
            value: U256::ZERO,
            input: init_code,
        }
    }

    fn to_length(&self) -> usize {
        match &self.to {
            Some(to) => to.length(),
            None => 1,
        }
    }

    fn encode_to(&self, out: &mut dyn BufMut) {
        match &self.to {
            Some(to) => to.encode(out),
            None => out.put_u8(EMPTY_STRING_CODE),
        }
    }

    fn fields_length(&self) -> usize {
        self.nonce.length()
            + self.gas_price.length()
            + self.gas_limit.length()
            + self.to_length()
            + self.value.length()
            + self.input.length()
    }

    fn encode_fields(&self, out: &mut dyn BufMut) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        self.encode_to(out);
        self.value.encode(out);
        self.input.encode(out);
    }

    /// RLP payload that gets hashed and signed: the fields followed by
    /// `chain_id, 0, 0`.
    pub fn signing_payload(&self) -> Vec<u8> {
        let payload_length =
            self.fields_length() + self.chain_id.length() + 0u8.length() + 0u8.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        self.chain_id.encode(&mut out);
        0u8.encode(&mut out);
        0u8.encode(&mut out);
        out
    }

    pub fn signature_hash(&self) -> B256 {
        keccak256(self.signing_payload())
    }

    /// EIP-155 `v`: `chain_id * 2 + 35 + y_parity`.
    pub fn eip155_v(&self, signature: &TxSignature) -> u64 {
        self.chain_id * 2 + 35 + u64::from(signature.y_parity)
    }

    /// RLP encoding of the signed transaction, ready for `eth_sendRawTransaction`.
    pub fn encode_signed(&self, signature: &TxSignature) -> Bytes {
        let v = self.eip155_v(signature);
        let payload_length =
            self.fields_length() + v.length() + signature.r.length() + signature.s.length();

        let mut out = Vec::with_capacity(payload_length + 4);
        Header {
            list: true,
            payload_length,
        }
        .encode(&mut out);
        self.encode_fields(&mut out);
        v.encode(&mut out);
        signature.r.encode(&mut out);
        signature.s.encode(&mut out);
        out.into()
    }

    /// Sign with `signer` and return the raw transaction with its hash.
    pub fn sign(&self, signer: &LocalSigner) -> Result<(B256, Bytes), anyhow::Error> {
        let signature = signer.sign_hash(&self.signature_hash())?;
        let raw = self.encode_signed(&signature);
        Ok((keccak256(&raw), raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Transaction from the EIP-155 example.
    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            chain_id: 1,
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Some(
                "0x3535353535353535353535353535353535353535"
                    .parse()
                    .unwrap(),
            ),
            value: U256::from(1_000_000_000_000_000_000u128),
            input: Bytes::new(),
        }
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            tx.signature_hash().to_string(),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_v() {
        let tx = eip155_example();
        let even = TxSignature {
            r: U256::from(1),
            s: U256::from(1),
            y_parity: false,
        };
        let odd = TxSignature {
            y_parity: true,
            ..even
        };
        assert_eq!(tx.eip155_v(&even), 37);
        assert_eq!(tx.eip155_v(&odd), 38);

        let sepolia = LegacyTransaction {
            chain_id: 11155111,
            ..tx
        };
        assert_eq!(sepolia.eip155_v(&even), 22310257);
    }

    #[test]
    fn test_creation_encodes_empty_recipient() {
        let tx = LegacyTransaction::creation(31337, 0, 1, 100_000, Bytes::from(vec![0x60, 0x80]));
        let payload = tx.signing_payload();

        let header = Header::decode(&mut payload.as_slice()).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length + header.length(), payload.len());

        // nonce 0, gas price 1, gas limit 100000, then an empty `to`.
        let body = &payload[header.length()..];
        assert_eq!(&body[..6], &[0x80, 0x01, 0x83, 0x01, 0x86, 0xa0]);
        assert_eq!(body[6], EMPTY_STRING_CODE);
    }

    #[test]
    fn test_signed_creation_is_a_valid_list() {
        let signer = LocalSigner::from_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let tx = LegacyTransaction::creation(31337, 3, 2_000_000_000, 500_000, Bytes::from(vec![0xfe]));

        let (hash, raw) = tx.sign(&signer).unwrap();
        assert_eq!(hash, keccak256(&raw));

        let header = Header::decode(&mut &raw[..]).unwrap();
        assert!(header.list);
        assert_eq!(header.payload_length + header.length(), raw.len());
    }
}
