// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Origins the user has connected, and the addresses each may see.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{json, Value};

use crate::approval::{ApprovalCategory, ApprovalQueue};
use crate::error::{WalletError, WalletResult};
use crate::models::ConnectedSites;
use crate::protocol::events::{EventBus, CONNECTED};
use crate::storage::{keys, SecureStore};

pub struct SiteRegistry {
    store: SecureStore,
    approvals: Arc<ApprovalQueue>,
    events: EventBus,
    /// Serializes read-modify-write of the connected-site map
    write_lock: Mutex<()>,
}

impl SiteRegistry {
    pub fn new(store: SecureStore, approvals: Arc<ApprovalQueue>, events: EventBus) -> Self {
        Self {
            store,
            approvals,
            events,
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> WalletResult<ConnectedSites> {
        Ok(self
            .store
            .get::<ConnectedSites>(keys::CONNECTED_SITES)?
            .unwrap_or_default())
    }

    /// Ask the user to connect `origin`.
    ///
    /// The approval metadata is the list of addresses the user picked.
    pub async fn connect(&self, origin: &str) -> WalletResult<Vec<String>> {
        let metadata = self
            .approvals
            .request(ApprovalCategory::Connect, json!({ "origin": origin }))
            .await?;
        let addresses = addresses_from(metadata)?;

        {
            let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
            let mut sites = self.load()?;
            sites.insert(origin.to_string(), addresses.clone());
            self.store.set(keys::CONNECTED_SITES, &sites)?;
        }

        tracing::info!(origin, count = addresses.len(), "Site connected");
        self.events.emit(
            CONNECTED,
            json!({ "origin": origin, "accounts": addresses }),
        );
        Ok(addresses)
    }

    pub fn is_connected(&self, origin: &str) -> WalletResult<bool> {
        Ok(self.load()?.contains_key(origin))
    }

    /// Addresses `origin` may see; empty when it is not connected.
    pub fn authorized_addresses(&self, origin: &str) -> WalletResult<Vec<String>> {
        Ok(self.load()?.remove(origin).unwrap_or_default())
    }

    pub fn disconnect(&self, origin: &str) -> WalletResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut sites = self.load()?;
        let removed = sites.remove(origin).is_some();
        if removed {
            self.store.set(keys::CONNECTED_SITES, &sites)?;
            tracing::info!(origin, "Site disconnected");
        }
        Ok(removed)
    }
}

fn addresses_from(metadata: Value) -> WalletResult<Vec<String>> {
    serde_json::from_value(metadata).map_err(|_| {
        WalletError::InvalidParams("connect approval must carry a list of addresses".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::TracingPresenter;
    use crate::storage::{MemoryBackend, StorageKey};
    use std::collections::HashSet;

    fn registry() -> (Arc<SiteRegistry>, Arc<ApprovalQueue>, EventBus) {
        let store = SecureStore::new(
            Arc::new(MemoryBackend::new()),
            Arc::new(StorageKey::derive("pw")),
        );
        let approvals = Arc::new(ApprovalQueue::new(store.clone(), Arc::new(TracingPresenter)));
        let events = EventBus::new();
        let sites = Arc::new(SiteRegistry::new(store, approvals.clone(), events.clone()));
        (sites, approvals, events)
    }

    async fn pending_id(approvals: &ApprovalQueue) -> String {
        loop {
            if let Some(request) = approvals.get_all().unwrap().pop() {
                return request.id;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn approved_connect_stores_addresses_and_emits() {
        let (sites, approvals, events) = registry();
        let mut rx = events.subscribe();

        let task = tokio::spawn({
            let sites = sites.clone();
            async move { sites.connect("https://dapp.example").await }
        });
        let id = pending_id(&approvals).await;
        assert_eq!(
            approvals.get_all().unwrap()[0].data["origin"],
            "https://dapp.example"
        );
        approvals.approve(&id, json!(["0xabc"])).unwrap();

        assert_eq!(task.await.unwrap().unwrap(), vec!["0xabc".to_string()]);
        assert!(sites.is_connected("https://dapp.example").unwrap());
        assert_eq!(
            sites.authorized_addresses("https://dapp.example").unwrap(),
            vec!["0xabc".to_string()]
        );
        assert_eq!(rx.recv().await.unwrap().event, CONNECTED);
    }

    #[tokio::test]
    async fn rejected_connect_leaves_no_trace() {
        let (sites, approvals, _) = registry();
        let task = tokio::spawn({
            let sites = sites.clone();
            async move { sites.connect("https://evil.example").await }
        });
        let id = pending_id(&approvals).await;
        approvals.reject(&id).unwrap();

        assert!(matches!(task.await.unwrap(), Err(WalletError::UserRejected)));
        assert!(!sites.is_connected("https://evil.example").unwrap());
    }

    #[tokio::test]
    async fn malformed_metadata_is_invalid_params() {
        let (sites, approvals, _) = registry();
        let task = tokio::spawn({
            let sites = sites.clone();
            async move { sites.connect("https://dapp.example").await }
        });
        let id = pending_id(&approvals).await;
        approvals.approve(&id, json!({"not": "a list"})).unwrap();

        assert!(matches!(
            task.await.unwrap(),
            Err(WalletError::InvalidParams(_))
        ));
        assert!(!sites.is_connected("https://dapp.example").unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_connects_are_all_kept() {
        let (sites, approvals, _) = registry();
        let origins: Vec<String> = (0..64).map(|i| format!("https://site{i}.example")).collect();

        let tasks: Vec<_> = origins
            .iter()
            .cloned()
            .map(|origin| {
                let sites = sites.clone();
                tokio::spawn(async move { sites.connect(&origin).await })
            })
            .collect();

        let mut decided = HashSet::new();
        while decided.len() < origins.len() {
            for request in approvals.get_all().unwrap() {
                if decided.insert(request.id.clone()) {
                    let approvals = approvals.clone();
                    tokio::spawn(async move { approvals.approve(&request.id, json!(["0xabc"])) });
                }
            }
            tokio::task::yield_now().await;
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        for origin in &origins {
            assert!(sites.is_connected(origin).unwrap(), "{origin} was lost");
        }
    }

    #[test]
    fn disconnect_removes_origin() {
        let (sites, _, _) = registry();
        assert!(!sites.disconnect("https://nobody.example").unwrap());
    }
}
