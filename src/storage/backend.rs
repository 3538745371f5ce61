// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Raw key-value persistence.
//!
//! A [`StorageBackend`] is an opaque byte store: it knows nothing about
//! tiers, encryption or record shapes. [`SecureStore`](super::SecureStore)
//! layers those on top.

use std::collections::HashMap;
use std::io;
use std::sync::RwLock;

/// Error type for storage backends.
#[derive(Debug)]
pub enum StorageError {
    /// I/O error while opening the backing file
    Io(io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Error reported by the embedded database
    Database(String),
    /// A lock guarding in-memory state was poisoned
    Poisoned,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "I/O error: {e}"),
            StorageError::Json(e) => write!(f, "JSON error: {e}"),
            StorageError::Database(msg) => write!(f, "Database error: {msg}"),
            StorageError::Poisoned => write!(f, "Storage lock poisoned"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for StorageError {
    fn from(e: io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Json(e)
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Opaque persistent key-value store.
pub trait StorageBackend: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Remove every key.
    fn clear(&self) -> StorageResult<()>;

    fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Process-local backend, used in tests and for ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let entries = self.entries.read().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let mut entries = self.entries.write().map_err(|_| StorageError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_set_get_remove() {
        let backend = MemoryBackend::new();
        assert!(backend.get("k").unwrap().is_none());

        backend.set("k", b"value").unwrap();
        assert_eq!(backend.get("k").unwrap().as_deref(), Some(&b"value"[..]));
        assert!(backend.contains("k").unwrap());

        backend.remove("k").unwrap();
        assert!(!backend.contains("k").unwrap());
    }

    #[test]
    fn memory_backend_clear() {
        let backend = MemoryBackend::new();
        backend.set("a", b"1").unwrap();
        backend.set("b", b"2").unwrap();
        backend.clear().unwrap();
        assert!(backend.get("a").unwrap().is_none());
        assert!(backend.get("b").unwrap().is_none());
    }
}
