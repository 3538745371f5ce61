// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passphrase-derived symmetric encryption for secure-tier records.
//!
//! ## Format
//!
//! ```text
//! hex(iv) ":" hex(ciphertext)
//! ```
//!
//! The key is `keccak256(passphrase)`, the cipher AES-256-CBC with PKCS#7
//! padding and a fresh random 16-byte IV per call. There is no
//! authentication tag: a wrong key is detected by a padding failure or by
//! the caller failing to parse the plaintext.

use aes::Aes256;
use alloy::hex;
use alloy::primitives::keccak256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

const IV_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    #[error("wrong key or corrupted ciphertext")]
    BadPadding,
}

/// 32-byte symmetric key derived from a passphrase.
#[derive(Clone)]
pub struct StorageKey([u8; 32]);

impl StorageKey {
    pub fn derive(passphrase: &str) -> Self {
        Self(keccak256(passphrase.as_bytes()).0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Drop for StorageKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl std::fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StorageKey(..)")
    }
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(key: &StorageKey, plaintext: &[u8]) -> String {
    let mut iv = [0u8; IV_LEN];
    rand::thread_rng().fill_bytes(&mut iv);

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), &iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
}

/// Decrypt a value produced by [`encrypt`].
pub fn decrypt(key: &StorageKey, encoded: &str) -> Result<Vec<u8>, CipherError> {
    let (iv_hex, ct_hex) = encoded
        .split_once(':')
        .ok_or_else(|| CipherError::Malformed("missing iv separator".into()))?;

    let iv = hex::decode(iv_hex).map_err(|e| CipherError::Malformed(format!("iv: {e}")))?;
    let ciphertext =
        hex::decode(ct_hex).map_err(|e| CipherError::Malformed(format!("ciphertext: {e}")))?;

    if iv.len() != IV_LEN {
        return Err(CipherError::Malformed(format!(
            "iv must be {IV_LEN} bytes, got {}",
            iv.len()
        )));
    }

    let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv)
        .map_err(|e| CipherError::Malformed(e.to_string()))?;

    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| CipherError::BadPadding)
}
