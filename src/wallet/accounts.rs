// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account registry and key material.
//!
//! The account list lives in the plain tier under `accounts`; each
//! account's key material lives in the secure tier under `ew{address}`.
//! Sequential accounts store the primary's phrase with their own index so
//! any account can be reloaded without touching another account's record.

use std::sync::{Arc, Mutex, PoisonError};

use alloy::hex;

use crate::blockchain::{AccountSigner, LocalAccount, SignerError};
use crate::error::{WalletError, WalletResult};
use crate::models::{Account, KeyMaterial};
use crate::session::SessionManager;
use crate::storage::{keys, SecureStore, StorageKey};

pub struct AccountRegistry {
    store: SecureStore,
    session: Arc<SessionManager>,
    /// Serializes read-modify-write of the account list
    write_lock: Mutex<()>,
}

impl AccountRegistry {
    pub fn new(store: SecureStore, session: Arc<SessionManager>) -> Self {
        Self {
            store,
            session,
            write_lock: Mutex::new(()),
        }
    }

    pub fn has_wallet(&self) -> WalletResult<bool> {
        Ok(!self.all()?.is_empty())
    }

    fn all(&self) -> WalletResult<Vec<Account>> {
        Ok(self
            .store
            .get::<Vec<Account>>(keys::ACCOUNTS)?
            .unwrap_or_default())
    }

    /// Accounts, optionally restricted to `allowed` addresses.
    pub fn list_accounts(&self, allowed: Option<&[String]>) -> WalletResult<Vec<Account>> {
        let accounts = self.all()?;
        Ok(match allowed {
            Some(allowed) => accounts
                .into_iter()
                .filter(|account| allowed.iter().any(|addr| account.matches(addr)))
                .collect(),
            None => accounts,
        })
    }

    pub fn find(&self, address: &str) -> WalletResult<Option<Account>> {
        Ok(self.all()?.into_iter().find(|a| a.matches(address)))
    }

    /// The selected account, falling back to the primary.
    pub fn current_account(&self) -> WalletResult<Option<Account>> {
        let accounts = self.all()?;
        let selected: Option<String> = self.store.get(keys::CURRENT_ADDRESS)?;
        let current = selected
            .and_then(|addr| accounts.iter().find(|a| a.matches(&addr)).cloned())
            .or_else(|| accounts.iter().find(|a| a.primary).cloned());
        Ok(current)
    }

    pub fn select_account(&self, address: &str) -> WalletResult<Account> {
        let account = self
            .find(address)?
            .ok_or_else(|| WalletError::KeyNotFound(address.to_string()))?;
        self.store.set(keys::CURRENT_ADDRESS, &account.address)?;
        Ok(account)
    }

    /// Create the seed account from a BIP-39 phrase.
    pub fn create_primary(&self, name: &str, mnemonic: &str) -> WalletResult<Account> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut accounts = self.all()?;
        if accounts.iter().any(|a| a.primary) {
            return Err(WalletError::InvalidParams(
                "a primary account already exists".into(),
            ));
        }

        let signer = LocalAccount::from_mnemonic(mnemonic, 0).map_err(invalid_key)?;
        let account = Account {
            name: name.to_string(),
            index: 0,
            address: signer.address(),
            primary: true,
            imported: false,
        };
        self.store.secure_set(
            &keys::encrypted_wallet(&account.address),
            &KeyMaterial::Mnemonic {
                phrase: mnemonic.trim().to_string(),
                index: 0,
            },
        )?;
        accounts.insert(0, account.clone());
        self.store.set(keys::ACCOUNTS, &accounts)?;
        self.store.set(keys::CURRENT_ADDRESS, &account.address)?;

        tracing::info!(address = %account.address, "Primary account created");
        Ok(account)
    }

    /// Derive the account at `index` from the primary's phrase.
    pub fn create_sequential(&self, primary: &str, index: u32) -> WalletResult<Account> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let phrase = match self.key_material(primary)? {
            KeyMaterial::Mnemonic { phrase, .. } => phrase,
            KeyMaterial::PrivateKey { .. } => {
                return Err(WalletError::InvalidParams(format!(
                    "{primary} has no seed phrase"
                )))
            }
        };

        let signer = LocalAccount::from_mnemonic(&phrase, index).map_err(invalid_key)?;
        let mut accounts = self.all()?;
        if let Some(existing) = accounts.iter().find(|a| a.matches(&signer.address())) {
            return Ok(existing.clone());
        }

        let account = Account {
            name: format!("Account {}", index + 1),
            index,
            address: signer.address(),
            primary: false,
            imported: false,
        };
        self.store.secure_set(
            &keys::encrypted_wallet(&account.address),
            &KeyMaterial::Mnemonic { phrase, index },
        )?;
        accounts.push(account.clone());
        self.store.set(keys::ACCOUNTS, &accounts)?;

        tracing::info!(address = %account.address, index, "Sequential account created");
        Ok(account)
    }

    /// Import a raw private key. Importing a known address returns it as-is.
    pub fn import_private_key(&self, name: &str, private_key: &str) -> WalletResult<Account> {
        let digits = private_key.trim().trim_start_matches("0x");
        if digits.len() != 64 {
            return Err(WalletError::InvalidParams(
                "private key must be 32 bytes of hex".into(),
            ));
        }
        let signer = LocalAccount::from_private_key_hex(digits).map_err(invalid_key)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut accounts = self.all()?;
        if let Some(existing) = accounts.iter().find(|a| a.matches(&signer.address())) {
            return Ok(existing.clone());
        }

        let account = Account {
            name: name.to_string(),
            index: 0,
            address: signer.address(),
            primary: false,
            imported: true,
        };
        self.store.secure_set(
            &keys::encrypted_wallet(&account.address),
            &KeyMaterial::PrivateKey {
                hex: signer.private_key_hex(),
            },
        )?;
        accounts.push(account.clone());
        self.store.set(keys::ACCOUNTS, &accounts)?;

        tracing::info!(address = %account.address, "Private key imported");
        Ok(account)
    }

    pub fn rename_account(&self, address: &str, name: &str) -> WalletResult<Account> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut accounts = self.all()?;
        let account = accounts
            .iter_mut()
            .find(|a| a.matches(address))
            .ok_or_else(|| WalletError::KeyNotFound(address.to_string()))?;
        account.name = name.to_string();
        let renamed = account.clone();
        self.store.set(keys::ACCOUNTS, &accounts)?;
        Ok(renamed)
    }

    /// Remove a non-primary account and its key material.
    pub fn delete_account(&self, address: &str) -> WalletResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut accounts = self.all()?;
        let position = accounts
            .iter()
            .position(|a| a.matches(address))
            .ok_or_else(|| WalletError::KeyNotFound(address.to_string()))?;
        if accounts[position].primary {
            return Err(WalletError::InvalidParams(
                "the primary account cannot be deleted".into(),
            ));
        }
        let removed = accounts.remove(position);
        self.store.set(keys::ACCOUNTS, &accounts)?;
        self.store.remove(&keys::encrypted_wallet(&removed.address))?;

        let selected: Option<String> = self.store.get(keys::CURRENT_ADDRESS)?;
        if selected.is_some_and(|addr| removed.matches(&addr)) {
            self.store.remove(keys::CURRENT_ADDRESS)?;
        }
        tracing::info!(address = %removed.address, "Account deleted");
        Ok(())
    }

    /// Uncompressed public key as `0x04...` hex.
    pub fn public_key(&self, address: &str) -> WalletResult<String> {
        let signer = self.load_signer(address)?;
        Ok(hex::encode_prefixed(signer.public_key()))
    }

    /// Export a private key. Requires the passphrase again, not just a session.
    pub fn private_key(&self, address: &str, passphrase: &str) -> WalletResult<String> {
        if !self.session.is_valid(passphrase)? {
            return Err(WalletError::InvalidPassphrase);
        }
        let store = self.store.with_key(StorageKey::derive(passphrase));
        let material = read_key_material(&store, address)?;
        Ok(format!("0x{}", signer_from(&material, address)?.private_key_hex()))
    }

    /// Signer for `address` under the current session.
    pub fn load_signer(&self, address: &str) -> WalletResult<LocalAccount> {
        let material = self.key_material(address)?;
        signer_from(&material, address)
    }

    fn key_material(&self, address: &str) -> WalletResult<KeyMaterial> {
        read_key_material(&self.store, address)
    }
}

fn read_key_material(store: &SecureStore, address: &str) -> WalletResult<KeyMaterial> {
    match store.secure_get::<KeyMaterial>(&keys::encrypted_wallet(address)) {
        Ok(Some(material)) => Ok(material),
        Ok(None) => Err(WalletError::KeyNotFound(address.to_string())),
        Err(WalletError::AccessViolation(_)) | Err(WalletError::DecryptError(_)) => {
            tracing::warn!(address, "Key material unreadable");
            Err(WalletError::KeyNotFound(address.to_string()))
        }
        Err(e) => Err(e),
    }
}

fn signer_from(material: &KeyMaterial, address: &str) -> WalletResult<LocalAccount> {
    let signer = match material {
        KeyMaterial::Mnemonic { phrase, index } => LocalAccount::from_mnemonic(phrase, *index),
        KeyMaterial::PrivateKey { hex } => LocalAccount::from_private_key_hex(hex),
    }
    .map_err(|e| {
        tracing::warn!(address, error = %e, "Stored key material is invalid");
        WalletError::KeyNotFound(address.to_string())
    })?;

    if !signer.address().eq_ignore_ascii_case(address) {
        return Err(WalletError::KeyNotFound(address.to_string()));
    }
    Ok(signer)
}

fn invalid_key(e: SignerError) -> WalletError {
    WalletError::InvalidParams(e.to_string())
}
