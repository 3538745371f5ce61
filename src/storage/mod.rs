// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Storage
//!
//! Persistent state lives in an opaque key-value [`StorageBackend`]
//! (`RedbBackend` on disk, `MemoryBackend` in tests). [`SecureStore`] adds
//! the two storage tiers on top.
//!
//! ## Security Model
//!
//! - Secure records are AES-256-CBC encrypted under `keccak256(passphrase)`
//! - The passphrase itself is never written to the backend
//! - A tier mismatch on read is an `AccessViolation`, never a silent fallback
//!
//! See [`keys`] for the persisted key layout.

pub mod backend;
pub mod cipher;
pub mod keys;
pub mod redb_backend;
pub mod secure_store;

pub use backend::{MemoryBackend, StorageBackend, StorageError, StorageResult};
pub use cipher::{CipherError, StorageKey};
pub use redb_backend::RedbBackend;
pub use secure_store::SecureStore;
