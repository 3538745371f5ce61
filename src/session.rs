// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session and passphrase lifecycle.
//!
//! ```text
//! LoggedOut --set_passphrase--> LoggedIn(expiry) --(expiry passes | logout)--> LoggedOut
//! ```
//!
//! The passphrase lives only in memory, wrapped in a `SecretString`. Expiry
//! is checked lazily: every key resolution runs [`SessionManager::check_expiry`]
//! first, so no timer task is needed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};

use crate::error::{WalletError, WalletResult};
use crate::storage::{keys, SecureStore, StorageBackend, StorageKey};

/// Lazy access to the current storage key.
///
/// Components hold a source rather than a key so they always observe the
/// session's present state.
pub trait PassphraseSource: Send + Sync {
    fn storage_key(&self) -> WalletResult<StorageKey>;
}

impl PassphraseSource for StorageKey {
    fn storage_key(&self) -> WalletResult<StorageKey> {
        Ok(self.clone())
    }
}

enum SessionState {
    LoggedOut,
    LoggedIn {
        passphrase: SecretString,
        expires_at: Instant,
    },
}

/// Owns the in-memory passphrase and its time-to-live.
pub struct SessionManager {
    state: Mutex<SessionState>,
    ttl: Duration,
    backend: Arc<dyn StorageBackend>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn StorageBackend>, ttl: Duration) -> Self {
        Self {
            state: Mutex::new(SessionState::LoggedOut),
            ttl,
            backend,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hold `passphrase` for one TTL from now.
    pub fn set_passphrase(&self, passphrase: &str) {
        *self.lock() = SessionState::LoggedIn {
            passphrase: SecretString::from(passphrase.to_string()),
            expires_at: Instant::now() + self.ttl,
        };
        tracing::info!(ttl_secs = self.ttl.as_secs(), "Session started");
    }

    /// Clear the passphrase if its TTL has passed.
    ///
    /// Returns whether a passphrase is still held.
    pub fn check_expiry(&self) -> bool {
        let mut state = self.lock();
        let expired = matches!(
            &*state,
            SessionState::LoggedIn { expires_at, .. } if Instant::now() > *expires_at
        );
        if expired {
            *state = SessionState::LoggedOut;
            tracing::info!("Session expired");
            return false;
        }
        matches!(*state, SessionState::LoggedIn { .. })
    }

    /// Time left before expiry, if signed in.
    pub fn remaining(&self) -> Option<Duration> {
        if !self.check_expiry() {
            return None;
        }
        match &*self.lock() {
            SessionState::LoggedIn { expires_at, .. } => {
                Some(expires_at.saturating_duration_since(Instant::now()))
            }
            SessionState::LoggedOut => None,
        }
    }

    pub fn logout(&self) {
        *self.lock() = SessionState::LoggedOut;
        tracing::info!("Session cleared");
    }

    fn current_key(&self) -> Option<StorageKey> {
        if !self.check_expiry() {
            return None;
        }
        match &*self.lock() {
            SessionState::LoggedIn { passphrase, .. } => {
                Some(StorageKey::derive(passphrase.expose_secret()))
            }
            SessionState::LoggedOut => None,
        }
    }

    /// Whether a passphrase is held and it opens the password-check record.
    pub fn is_signed_in(&self) -> WalletResult<bool> {
        match self.current_key() {
            Some(key) => self.key_is_valid(key),
            None => Ok(false),
        }
    }

    /// Fail with `NotSignedIn` unless [`Self::is_signed_in`] holds.
    pub fn require_signed_in(&self) -> WalletResult<()> {
        if self.is_signed_in()? {
            Ok(())
        } else {
            Err(WalletError::NotSignedIn)
        }
    }

    /// Check a candidate passphrase without touching session state.
    pub fn is_valid(&self, candidate: &str) -> WalletResult<bool> {
        self.key_is_valid(StorageKey::derive(candidate))
    }

    fn key_is_valid(&self, key: StorageKey) -> WalletResult<bool> {
        let store = SecureStore::new(Arc::clone(&self.backend), Arc::new(key));
        match store.secure_get::<String>(keys::PASSWORD_CHECKER) {
            Ok(Some(marker)) => Ok(marker == keys::PASSWORD_CHECKER_VALUE),
            Ok(None) => Ok(false),
            Err(WalletError::DecryptError(_)) | Err(WalletError::AccessViolation(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Set up the passphrase for a new wallet and sign in with it.
    ///
    /// If a password-check record already exists the passphrase must open
    /// it, otherwise existing key material would become unreadable.
    pub fn initialize(&self, passphrase: &str) -> WalletResult<()> {
        if self.backend.contains(keys::PASSWORD_CHECKER)? {
            if !self.is_valid(passphrase)? {
                return Err(WalletError::InvalidPassphrase);
            }
        } else {
            let store = SecureStore::new(
                Arc::clone(&self.backend),
                Arc::new(StorageKey::derive(passphrase)),
            );
            store.secure_set(keys::PASSWORD_CHECKER, keys::PASSWORD_CHECKER_VALUE)?;
        }
        self.set_passphrase(passphrase);
        Ok(())
    }
}

impl PassphraseSource for SessionManager {
    fn storage_key(&self) -> WalletResult<StorageKey> {
        self.current_key().ok_or(WalletError::NotSignedIn)
    }
}
