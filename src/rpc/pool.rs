// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-network client cache.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::client::RpcClient;
use super::transport::GraphqlTransport;
use crate::blockchain::Network;

struct CachedClient {
    network_id: String,
    candidates: Vec<String>,
    client: Arc<RpcClient>,
}

/// Hands out the [`RpcClient`] for the current network.
///
/// Endpoint probing happens once per network; switching networks (or
/// editing a network's endpoints) builds a fresh client.
pub struct RpcPool {
    transport: Arc<dyn GraphqlTransport>,
    freshness_window: u64,
    cached: Mutex<Option<CachedClient>>,
}

impl RpcPool {
    pub fn new(transport: Arc<dyn GraphqlTransport>, freshness_window: u64) -> Self {
        Self {
            transport,
            freshness_window,
            cached: Mutex::new(None),
        }
    }

    pub async fn client_for(&self, network: &Network) -> Arc<RpcClient> {
        let candidates = network.endpoints();
        let mut cached = self.cached.lock().await;

        if let Some(entry) = cached.as_ref() {
            if entry.network_id == network.id && entry.candidates == candidates {
                return Arc::clone(&entry.client);
            }
        }

        tracing::info!(network = %network.id, "Connecting RPC client");
        let client = Arc::new(
            RpcClient::connect(
                Arc::clone(&self.transport),
                candidates.clone(),
                self.freshness_window,
            )
            .await,
        );
        *cached = Some(CachedClient {
            network_id: network.id.clone(),
            candidates,
            client: Arc::clone(&client),
        });
        client
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::default_networks;
    use crate::test_support::MockTransport;
    use serde_json::json;

    fn probing_transport() -> Arc<MockTransport> {
        Arc::new(MockTransport::new(|_, _, _| {
            Ok(json!({ "chainQuery": { "blockQuery": { "blocks": [{ "index": 1 }] } } }))
        }))
    }

    fn with_fallback(mut network: Network) -> Network {
        network.fallback_endpoints = vec!["https://fallback.example/graphql".into()];
        network
    }

    #[tokio::test]
    async fn reuses_client_for_same_network() {
        let transport = probing_transport();
        let pool = RpcPool::new(transport.clone(), 30);
        let odin = with_fallback(default_networks().remove(0));

        let first = pool.client_for(&odin).await;
        let second = pool.client_for(&odin).await;
        assert!(Arc::ptr_eq(&first, &second));
        // one probe per endpoint, done once
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn switching_network_rebuilds_client() {
        let pool = RpcPool::new(probing_transport(), 30);
        let networks = default_networks();

        let odin = pool.client_for(&networks[0]).await;
        let heimdall = pool.client_for(&networks[1]).await;
        assert!(!Arc::ptr_eq(&odin, &heimdall));
        assert_eq!(heimdall.endpoints(), &[networks[1].gql_endpoint.clone()]);
    }
}
