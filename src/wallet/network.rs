// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Network list and current-network selection.

use std::sync::{Mutex, PoisonError};

use serde_json::json;

use crate::blockchain::{default_networks, Network};
use crate::error::{WalletError, WalletResult};
use crate::protocol::events::{EventBus, NETWORK_CHANGED};
use crate::storage::{keys, SecureStore};

pub struct NetworkController {
    store: SecureStore,
    events: EventBus,
    /// Serializes read-modify-write of the network list and selection
    write_lock: Mutex<()>,
}

impl NetworkController {
    pub fn new(store: SecureStore, events: EventBus) -> Self {
        Self {
            store,
            events,
            write_lock: Mutex::new(()),
        }
    }

    /// Install the default networks on first run.
    pub fn ensure_defaults(&self) -> WalletResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.list_networks()?.is_empty() {
            let networks = default_networks();
            self.store.set(keys::NETWORKS, &networks)?;
            self.store.set(keys::CURRENT_NETWORK, &networks[0].id)?;
            tracing::info!("Default networks installed");
        }
        Ok(())
    }

    pub fn list_networks(&self) -> WalletResult<Vec<Network>> {
        Ok(self
            .store
            .get::<Vec<Network>>(keys::NETWORKS)?
            .unwrap_or_default())
    }

    pub fn get_current_network(&self) -> WalletResult<Network> {
        let current: Option<String> = self.store.get(keys::CURRENT_NETWORK)?;
        let networks = self.list_networks()?;
        match current {
            Some(id) => networks
                .into_iter()
                .find(|n| n.id == id)
                .ok_or(WalletError::NetworkNotFound(id)),
            None => networks
                .into_iter()
                .next()
                .ok_or_else(|| WalletError::NetworkNotFound("<none>".into())),
        }
    }

    /// Select `id` and announce it to every connection.
    pub fn switch_network(&self, id: &str) -> WalletResult<Network> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.select(id)
    }

    /// Caller holds `write_lock`.
    fn select(&self, id: &str) -> WalletResult<Network> {
        let network = self
            .list_networks()?
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| WalletError::NetworkNotFound(id.to_string()))?;

        self.store.set(keys::CURRENT_NETWORK, &network.id)?;
        tracing::info!(network = %network.id, "Network switched");
        self.events.emit(NETWORK_CHANGED, json!(network));
        Ok(network)
    }

    /// Add a user-supplied network and select it.
    pub fn import_network(&self, network: Network) -> WalletResult<Network> {
        network.validate().map_err(WalletError::InvalidParams)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut networks = self.list_networks()?;
        if networks.iter().any(|n| n.id == network.id) {
            return Err(WalletError::InvalidParams(format!(
                "network `{}` already exists",
                network.id
            )));
        }
        let id = network.id.clone();
        networks.push(network);
        self.store.set(keys::NETWORKS, &networks)?;
        self.select(&id)
    }

    /// Replace the stored definition of an existing network.
    pub fn update_network(&self, network: Network) -> WalletResult<Network> {
        network.validate().map_err(WalletError::InvalidParams)?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut networks = self.list_networks()?;
        let slot = networks
            .iter_mut()
            .find(|n| n.id == network.id)
            .ok_or_else(|| WalletError::NetworkNotFound(network.id.clone()))?;
        *slot = network.clone();
        self.store.set(keys::NETWORKS, &networks)?;
        Ok(network)
    }

    /// Remove a network; deleting the current one selects the first left.
    pub fn delete_network(&self, id: &str) -> WalletResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut networks = self.list_networks()?;
        let before = networks.len();
        networks.retain(|n| n.id != id);
        if networks.len() == before {
            return Err(WalletError::NetworkNotFound(id.to_string()));
        }
        let Some(first) = networks.first().map(|n| n.id.clone()) else {
            return Err(WalletError::InvalidParams(
                "cannot delete the last network".into(),
            ));
        };
        self.store.set(keys::NETWORKS, &networks)?;

        let current: Option<String> = self.store.get(keys::CURRENT_NETWORK)?;
        if current.as_deref() == Some(id) {
            self.select(&first)?;
        }
        Ok(())
    }
}
