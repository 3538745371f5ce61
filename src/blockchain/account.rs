// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account key handling.
//!
//! Signature math stays behind the [`AccountSigner`] trait. The local
//! implementation wraps an alloy `PrivateKeySigner` and can be built from a
//! raw private key or derived from a BIP-39 phrase at
//! `m/44'/60'/0'/0/{index}`.

use alloy::hex;
use alloy::primitives::keccak256;
use alloy::signers::local::{coins_bip39::English, MnemonicBuilder, PrivateKeySigner};
use alloy::signers::SignerSync;

#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

/// Opaque account crypto.
pub trait AccountSigner: Send + Sync {
    /// Checksummed `0x` address.
    fn address(&self) -> String;

    /// Uncompressed SEC1 public key (65 bytes).
    fn public_key(&self) -> Vec<u8>;

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError>;
}

/// In-process secp256k1 account.
#[derive(Debug, Clone)]
pub struct LocalAccount {
    signer: PrivateKeySigner,
}

impl LocalAccount {
    /// Build from a hex private key, with or without `0x`.
    pub fn from_private_key_hex(private_key_hex: &str) -> Result<Self, SignerError> {
        let key_bytes = hex::decode(private_key_hex.trim())
            .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?;

        let signer = PrivateKeySigner::from_slice(&key_bytes)
            .map_err(|e| SignerError::InvalidPrivateKey(e.to_string()))?;
        Ok(Self { signer })
    }

    /// Derive the account at `index` from a BIP-39 phrase.
    pub fn from_mnemonic(phrase: &str, index: u32) -> Result<Self, SignerError> {
        let signer = MnemonicBuilder::<English>::default()
            .phrase(phrase.trim())
            .index(index)
            .map_err(|e| SignerError::InvalidMnemonic(e.to_string()))?
            .build()
            .map_err(|e| SignerError::InvalidMnemonic(e.to_string()))?;
        Ok(Self { signer })
    }

    /// Hex private key without `0x`.
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.signer.to_bytes())
    }
}

impl AccountSigner for LocalAccount {
    fn address(&self) -> String {
        self.signer.address().to_checksum(None)
    }

    fn public_key(&self) -> Vec<u8> {
        self.signer
            .credential()
            .verifying_key()
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignerError> {
        let signature = self
            .signer
            .sign_hash_sync(&keccak256(message))
            .map_err(|e| SignerError::Signing(e.to_string()))?;
        Ok(signature.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PHRASE: &str = "test test test test test test test test test test test junk";

    #[test]
    fn derives_well_known_first_account() {
        let account = LocalAccount::from_mnemonic(TEST_PHRASE, 0).unwrap();
        assert_eq!(
            account.address().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn sequential_indices_differ() {
        let first = LocalAccount::from_mnemonic(TEST_PHRASE, 0).unwrap();
        let second = LocalAccount::from_mnemonic(TEST_PHRASE, 1).unwrap();
        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn private_key_round_trips_to_same_address() {
        let derived = LocalAccount::from_mnemonic(TEST_PHRASE, 2).unwrap();
        let imported =
            LocalAccount::from_private_key_hex(&format!("0x{}", derived.private_key_hex())).unwrap();
        assert_eq!(derived.address(), imported.address());
    }

    #[test]
    fn public_key_is_uncompressed() {
        let account = LocalAccount::from_private_key_hex(&"01".repeat(32)).unwrap();
        let public_key = account.public_key();
        assert_eq!(public_key.len(), 65);
        assert_eq!(public_key[0], 0x04);
    }

    #[test]
    fn signatures_are_65_bytes() {
        let account = LocalAccount::from_private_key_hex(&"01".repeat(32)).unwrap();
        assert_eq!(account.sign(b"payload").unwrap().len(), 65);
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(LocalAccount::from_private_key_hex("xyz").is_err());
        assert!(LocalAccount::from_private_key_hex("00").is_err());
        assert!(LocalAccount::from_mnemonic("not a mnemonic", 0).is_err());
    }
}
