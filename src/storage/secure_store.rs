// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Two-tier record storage.
//!
//! Every value is persisted as a JSON record `{"v": ..., "secure": bool}`.
//! Plain records hold the value as-is; secure records hold the encrypted
//! JSON of the value. Each tier is only readable through its own accessor:
//! reading a secure record with [`SecureStore::get`] (or a plain one with
//! [`SecureStore::secure_get`]) fails with `AccessViolation` instead of
//! leaking ciphertext or accepting unencrypted secrets.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::backend::StorageBackend;
use super::cipher::{self, CipherError, StorageKey};
use crate::error::{WalletError, WalletResult};
use crate::session::PassphraseSource;

#[derive(Debug, Serialize, Deserialize)]
struct StorageRecord {
    v: Value,
    #[serde(default)]
    secure: bool,
}

/// Tiered store over an opaque backend.
///
/// The encryption key is resolved through a [`PassphraseSource`] on every
/// secure access, so an expired session fails the call instead of using a
/// stale key.
#[derive(Clone)]
pub struct SecureStore {
    backend: Arc<dyn StorageBackend>,
    passphrase: Arc<dyn PassphraseSource>,
}

impl SecureStore {
    pub fn new(backend: Arc<dyn StorageBackend>, passphrase: Arc<dyn PassphraseSource>) -> Self {
        Self {
            backend,
            passphrase,
        }
    }

    /// Same backend, fixed key. Used to test a candidate passphrase.
    pub fn with_key(&self, key: StorageKey) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            passphrase: Arc::new(key),
        }
    }

    fn read_record(&self, key: &str) -> WalletResult<Option<StorageRecord>> {
        match self.backend.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn write_record(&self, key: &str, record: &StorageRecord) -> WalletResult<()> {
        let bytes = serde_json::to_vec(record)?;
        self.backend.set(key, &bytes)?;
        Ok(())
    }

    /// Write a plain record.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> WalletResult<()> {
        let record = StorageRecord {
            v: serde_json::to_value(value)?,
            secure: false,
        };
        self.write_record(key, &record)
    }

    /// Read a plain record.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> WalletResult<Option<T>> {
        let Some(record) = self.read_record(key)? else {
            return Ok(None);
        };
        if record.secure {
            return Err(WalletError::AccessViolation(key.to_string()));
        }
        Ok(Some(serde_json::from_value(record.v)?))
    }

    /// Encrypt and write a secure record.
    pub fn secure_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> WalletResult<()> {
        let storage_key = self.passphrase.storage_key()?;
        let plaintext = serde_json::to_vec(value)?;
        let record = StorageRecord {
            v: Value::String(cipher::encrypt(&storage_key, &plaintext)),
            secure: true,
        };
        self.write_record(key, &record)
    }

    /// Read and decrypt a secure record.
    pub fn secure_get<T: DeserializeOwned>(&self, key: &str) -> WalletResult<Option<T>> {
        let Some(record) = self.read_record(key)? else {
            return Ok(None);
        };
        if !record.secure {
            return Err(WalletError::AccessViolation(key.to_string()));
        }
        let Value::String(encoded) = record.v else {
            return Err(CipherError::Malformed("secure record is not a string".into()).into());
        };

        let storage_key = self.passphrase.storage_key()?;
        let plaintext = cipher::decrypt(&storage_key, &encoded)?;
        // A wrong key that happens to unpad cleanly still fails here
        let value: Value = serde_json::from_slice(&plaintext)
            .map_err(|_| WalletError::DecryptError(CipherError::BadPadding))?;
        Ok(Some(serde_json::from_value(value)?))
    }

    /// Existence check, independent of tier.
    pub fn has(&self, key: &str) -> WalletResult<bool> {
        Ok(self.backend.contains(key)?)
    }

    pub fn remove(&self, key: &str) -> WalletResult<()> {
        self.backend.remove(key)?;
        Ok(())
    }

    /// Remove every record in both tiers.
    pub fn clear_all(&self) -> WalletResult<()> {
        self.backend.clear()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;

    struct SignedOut;

    impl PassphraseSource for SignedOut {
        fn storage_key(&self) -> WalletResult<StorageKey> {
            Err(WalletError::NotSignedIn)
        }
    }

    fn store(passphrase: &str) -> SecureStore {
        SecureStore::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(StorageKey::derive(passphrase)),
        )
    }

    #[test]
    fn plain_round_trip() {
        let store = store("pw");
        store.set("cn", "odin").unwrap();
        assert_eq!(store.get::<String>("cn").unwrap().as_deref(), Some("odin"));
        assert!(store.get::<String>("missing").unwrap().is_none());
    }

    #[test]
    fn secure_round_trip() {
        let store = store("pw");
        let secret = serde_json::json!({"privateKey": "0x01"});
        store.secure_set("ew0xabc", &secret).unwrap();
        assert_eq!(store.secure_get::<Value>("ew0xabc").unwrap(), Some(secret));
    }

    #[test]
    fn secure_record_is_not_stored_in_clear() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SecureStore::new(backend.clone(), Arc::new(StorageKey::derive("pw")));
        store.secure_set("ew0xabc", "topsecret").unwrap();

        let raw = String::from_utf8(backend.get("ew0xabc").unwrap().unwrap()).unwrap();
        assert!(raw.contains("\"secure\":true"));
        assert!(!raw.contains("topsecret"));
    }

    #[test]
    fn plain_accessor_rejects_secure_record() {
        let store = store("pw");
        store.secure_set("k", &42).unwrap();
        assert!(matches!(
            store.get::<Value>("k"),
            Err(WalletError::AccessViolation(key)) if key == "k"
        ));
    }

    #[test]
    fn secure_accessor_rejects_plain_record() {
        let store = store("pw");
        store.set("k", &42).unwrap();
        assert!(matches!(
            store.secure_get::<Value>("k"),
            Err(WalletError::AccessViolation(_))
        ));
    }

    #[test]
    fn record_without_secure_flag_is_plain() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set("legacy", br#"{"v":"x"}"#).unwrap();
        let store = SecureStore::new(backend, Arc::new(StorageKey::derive("pw")));

        assert_eq!(store.get::<String>("legacy").unwrap().as_deref(), Some("x"));
        assert!(matches!(
            store.secure_get::<String>("legacy"),
            Err(WalletError::AccessViolation(_))
        ));
    }

    #[test]
    fn wrong_key_is_decrypt_error() {
        let store = store("right");
        store.secure_set("k", &serde_json::json!({"a": [1, 2, 3]})).unwrap();

        let other = store.with_key(StorageKey::derive("wrong"));
        assert!(matches!(
            other.secure_get::<Value>("k"),
            Err(WalletError::DecryptError(_))
        ));
    }

    #[test]
    fn secure_access_requires_session() {
        let store = SecureStore::new(Arc::new(MemoryBackend::new()), Arc::new(SignedOut));
        assert!(matches!(store.secure_set("k", &1), Err(WalletError::NotSignedIn)));
        assert!(!store.has("k").unwrap());
    }

    #[test]
    fn has_is_tier_independent() {
        let store = store("pw");
        store.set("plain", &1).unwrap();
        store.secure_set("secret", &2).unwrap();
        assert!(store.has("plain").unwrap());
        assert!(store.has("secret").unwrap());

        store.remove("plain").unwrap();
        assert!(!store.has("plain").unwrap());

        store.clear_all().unwrap();
        assert!(!store.has("secret").unwrap());
    }
}
