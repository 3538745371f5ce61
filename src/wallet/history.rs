// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-signer list of staged transactions, newest first.

use std::sync::{Mutex, PoisonError};

use crate::error::{WalletError, WalletResult};
use crate::models::{PendingTransaction, TxStatus};
use crate::storage::{keys, SecureStore};

/// Entries kept per signer.
pub const HISTORY_LIMIT: usize = 100;

pub struct TxHistory {
    store: SecureStore,
    write_lock: Mutex<()>,
}

impl TxHistory {
    pub fn new(store: SecureStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn list(&self, signer: &str) -> WalletResult<Vec<PendingTransaction>> {
        Ok(self
            .store
            .get::<Vec<PendingTransaction>>(&keys::transactions(signer))?
            .unwrap_or_default())
    }

    /// Prepend `tx` to its signer's list, dropping the oldest beyond the limit.
    pub fn push(&self, tx: PendingTransaction) -> WalletResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let key = keys::transactions(&tx.signer);
        let mut txs = self.list(&tx.signer)?;
        txs.insert(0, tx);
        txs.truncate(HISTORY_LIMIT);
        self.store.set(&key, &txs)
    }

    pub fn update_status(
        &self,
        signer: &str,
        id: &str,
        status: TxStatus,
    ) -> WalletResult<PendingTransaction> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut txs = self.list(signer)?;
        let tx = txs
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or_else(|| WalletError::InvalidParams(format!("unknown transaction {id}")))?;
        tx.status = status;
        let updated = tx.clone();
        self.store.set(&keys::transactions(signer), &txs)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransferData;
    use crate::storage::{MemoryBackend, StorageKey};
    use std::sync::Arc;

    fn history() -> TxHistory {
        TxHistory::new(SecureStore::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(StorageKey::derive("pw")),
        ))
    }

    fn tx(id: usize) -> PendingTransaction {
        PendingTransaction {
            id: format!("tx-{id}"),
            endpoint: "https://node.example/graphql".into(),
            status: TxStatus::Staging,
            kind: "transfer_asset5".into(),
            signer: "0xAbC".into(),
            timestamp: id as i64,
            data: TransferData {
                sender: "0xAbC".into(),
                receiver: "0xdef".into(),
                amount: "1".into(),
            },
        }
    }

    #[test]
    fn keeps_newest_hundred() {
        let history = history();
        for id in 0..=HISTORY_LIMIT {
            history.push(tx(id)).unwrap();
        }

        let txs = history.list("0xabc").unwrap();
        assert_eq!(txs.len(), HISTORY_LIMIT);
        assert_eq!(txs[0].id, format!("tx-{HISTORY_LIMIT}"));
        assert_eq!(txs[HISTORY_LIMIT - 1].id, "tx-1");
    }

    #[test]
    fn update_status_in_place() {
        let history = history();
        history.push(tx(1)).unwrap();
        history.push(tx(2)).unwrap();

        history
            .update_status("0xABC", "tx-1", TxStatus::Success)
            .unwrap();
        let txs = history.list("0xabc").unwrap();
        assert_eq!(txs[1].status, TxStatus::Success);
        assert_eq!(txs[0].status, TxStatus::Staging);

        assert!(history
            .update_status("0xabc", "tx-9", TxStatus::Failure)
            .is_err());
    }
}
