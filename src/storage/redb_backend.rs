// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Durable backend on redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `kv`: storage key → JSON record bytes

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};

use super::backend::{StorageBackend, StorageError, StorageResult};

/// Single table holding every storage record.
const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

fn db_err(e: impl Into<redb::Error>) -> StorageError {
    StorageError::Database(e.into().to_string())
}

/// redb-backed [`StorageBackend`].
pub struct RedbBackend {
    db: Database,
}

impl RedbBackend {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            let _ = write_txn.open_table(KV).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db })
    }
}

impl StorageBackend for RedbBackend {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(KV).map_err(db_err)?;
        let value = table.get(key).map_err(db_err)?;
        Ok(value.map(|guard| guard.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(KV).map_err(db_err)?;
            table.insert(key, value).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(KV).map_err(db_err)?;
            table.remove(key).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        write_txn.delete_table(KV).map_err(db_err)?;
        {
            let _ = write_txn.open_table(KV).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        tracing::info!("Wallet storage cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (RedbBackend, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = RedbBackend::open(&dir.path().join("test.redb")).unwrap();
        (db, dir)
    }

    #[test]
    fn set_get_remove() {
        let (db, _dir) = temp_db();
        db.set("accounts", b"[]").unwrap();
        assert_eq!(db.get("accounts").unwrap().as_deref(), Some(&b"[]"[..]));

        db.remove("accounts").unwrap();
        assert!(db.get("accounts").unwrap().is_none());
    }

    #[test]
    fn clear_drops_everything_and_table_stays_usable() {
        let (db, _dir) = temp_db();
        db.set("a", b"1").unwrap();
        db.set("b", b"2").unwrap();
        db.clear().unwrap();

        assert!(db.get("a").unwrap().is_none());
        db.set("c", b"3").unwrap();
        assert!(db.contains("c").unwrap());
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.redb");
        {
            let db = RedbBackend::open(&path).unwrap();
            db.set("cn", b"\"odin\"").unwrap();
        }
        let db = RedbBackend::open(&path).unwrap();
        assert_eq!(db.get("cn").unwrap().as_deref(), Some(&b"\"odin\""[..]));
    }
}
