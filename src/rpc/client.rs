// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Multi-endpoint GraphQL client with failover.
//!
//! ## Endpoint Selection
//!
//! At construction every candidate is asked for its latest block index.
//! Endpoints lagging the best answer by `freshness_window` blocks or more,
//! or not answering at all, are dropped. A single candidate is used as-is.
//!
//! ## Failover
//!
//! [`RpcClient::call_endpoint`] tries the retained endpoints in order and
//! returns the first success. If every endpoint fails the caller gets
//! `AllEndpointsFailed` with each failure in call order. There are no
//! retries beyond that single pass.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use super::transport::{GraphqlTransport, RpcError};
use crate::error::{WalletError, WalletResult};
use crate::models::TxStatus;

const LAST_BLOCK_INDEX_QUERY: &str = r#"
query getLastBlockIndex($offset: Int!) {
  chainQuery { blockQuery { blocks(offset: $offset, limit: 1, desc: true) { index } } }
}"#;

const BALANCE_QUERY: &str = r#"
query getBalance($address: Address!) {
  goldBalance(address: $address)
}"#;

const NEXT_TX_NONCE_QUERY: &str = r#"
query getNextTxNonce($address: Address!) {
  transaction { nextTxNonce(address: $address) }
}"#;

const TRANSFER_ASSET_QUERY: &str = r#"
query getTransferAsset($sender: Address!, $receiver: Address!, $amount: String!) {
  actionQuery { transferAsset(sender: $sender, recipient: $receiver, currency: NCG, amount: $amount) }
}"#;

const UNSIGNED_TX_QUERY: &str = r#"
query unsignedTx($publicKey: String!, $plainValue: String!, $nonce: Long, $maxGasPrice: FungibleAssetValueInputType) {
  transaction { unsignedTransaction(publicKey: $publicKey, plainValue: $plainValue, nonce: $nonce, maxGasPrice: $maxGasPrice) }
}"#;

const STAGE_TX_MUTATION: &str = r#"
mutation stageTransaction($payload: String!) {
  stageTransaction(payload: $payload)
}"#;

const TX_STATUS_QUERY: &str = r#"
query transactionResult($txId: TxId!) {
  transaction { transactionResult(txId: $txId) { txStatus } }
}"#;

/// One endpoint's failure inside an aggregate error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{endpoint}: {error}")]
pub struct EndpointFailure {
    pub endpoint: String,
    pub error: RpcError,
}

impl EndpointFailure {
    pub fn new(endpoint: impl Into<String>, error: RpcError) -> Self {
        Self {
            endpoint: endpoint.into(),
            error,
        }
    }
}

/// Result of staging a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTx {
    pub tx_id: String,
    /// Endpoint that accepted the payload
    pub endpoint: String,
}

/// Keep endpoints whose block index is within `window` of the best one.
///
/// `reports` holds only the endpoints that answered.
pub fn select_fresh(candidates: &[String], reports: &[(String, u64)], window: u64) -> Vec<String> {
    let Some(max) = reports.iter().map(|(_, index)| *index).max() else {
        return Vec::new();
    };
    candidates
        .iter()
        .filter(|endpoint| {
            reports
                .iter()
                .any(|(reported, index)| reported == *endpoint && max - index < window)
        })
        .cloned()
        .collect()
}

fn field<'a>(data: &'a Value, pointer: &str) -> Result<&'a Value, RpcError> {
    data.pointer(pointer)
        .filter(|v| !v.is_null())
        .ok_or_else(|| RpcError::MalformedResponse(format!("missing {pointer}")))
}

fn string_field(data: &Value, pointer: &str) -> Result<String, RpcError> {
    field(data, pointer)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| RpcError::MalformedResponse(format!("{pointer} is not a string")))
}

fn u64_field(data: &Value, pointer: &str) -> Result<u64, RpcError> {
    let value = field(data, pointer)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .ok_or_else(|| RpcError::MalformedResponse(format!("{pointer} is not an integer")))
}

/// GraphQL client bound to a fixed endpoint list.
pub struct RpcClient {
    transport: Arc<dyn GraphqlTransport>,
    endpoints: Vec<String>,
}

impl RpcClient {
    /// Use `endpoints` without probing them.
    pub fn with_endpoints(transport: Arc<dyn GraphqlTransport>, endpoints: Vec<String>) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Probe `candidates` and keep the fresh ones.
    ///
    /// If none answers, every candidate is kept so that calls fail with
    /// the real per-endpoint errors instead of an empty aggregate.
    pub async fn connect(
        transport: Arc<dyn GraphqlTransport>,
        candidates: Vec<String>,
        freshness_window: u64,
    ) -> Self {
        if candidates.len() <= 1 {
            return Self::with_endpoints(transport, candidates);
        }

        let mut reports = Vec::with_capacity(candidates.len());
        for endpoint in &candidates {
            match last_block_index_at(transport.as_ref(), endpoint).await {
                Ok(index) => reports.push((endpoint.clone(), index)),
                Err(e) => {
                    tracing::warn!(endpoint = %endpoint, error = %e, "Endpoint health probe failed");
                }
            }
        }

        let mut endpoints = select_fresh(&candidates, &reports, freshness_window);
        if endpoints.is_empty() {
            tracing::warn!("No endpoint answered the health probe; keeping all candidates");
            endpoints = candidates;
        }
        tracing::debug!(endpoints = ?endpoints, "RPC endpoints selected");

        Self::with_endpoints(transport, endpoints)
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    /// Run `op` against each endpoint in order until one succeeds.
    pub async fn call_endpoint<T, F, Fut>(&self, mut op: F) -> WalletResult<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let mut failures = Vec::new();
        for endpoint in &self.endpoints {
            match op(endpoint.clone()).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    tracing::warn!(endpoint = %endpoint, error = %error, "RPC call failed");
                    failures.push(EndpointFailure::new(endpoint.clone(), error));
                }
            }
        }
        Err(WalletError::AllEndpointsFailed(failures))
    }

    /// Execute `query` with failover; `extract` runs per endpoint so a
    /// malformed answer also moves on to the next one.
    async fn query<T>(
        &self,
        query: &'static str,
        variables: Value,
        extract: fn(&Value) -> Result<T, RpcError>,
    ) -> WalletResult<(T, String)> {
        self.call_endpoint(|endpoint| {
            let transport = Arc::clone(&self.transport);
            let variables = variables.clone();
            async move {
                let data = transport.execute(&endpoint, query, variables).await?;
                Ok((extract(&data)?, endpoint))
            }
        })
        .await
    }

    pub async fn last_block_index(&self) -> WalletResult<u64> {
        let (index, _) = self
            .query(LAST_BLOCK_INDEX_QUERY, json!({ "offset": 0 }), |data| {
                u64_field(data, "/chainQuery/blockQuery/blocks/0/index")
            })
            .await?;
        Ok(index)
    }

    pub async fn balance(&self, address: &str) -> WalletResult<String> {
        let (balance, _) = self
            .query(BALANCE_QUERY, json!({ "address": address }), |data| {
                string_field(data, "/goldBalance")
            })
            .await?;
        Ok(balance)
    }

    pub async fn next_tx_nonce(&self, address: &str) -> WalletResult<u64> {
        let (nonce, _) = self
            .query(NEXT_TX_NONCE_QUERY, json!({ "address": address }), |data| {
                u64_field(data, "/transaction/nextTxNonce")
            })
            .await?;
        Ok(nonce)
    }

    /// Hex-encoded transfer action built by the node.
    pub async fn transfer_asset(
        &self,
        sender: &str,
        receiver: &str,
        amount: &str,
    ) -> WalletResult<String> {
        let variables = json!({ "sender": sender, "receiver": receiver, "amount": amount });
        let (action, _) = self
            .query(TRANSFER_ASSET_QUERY, variables, |data| {
                string_field(data, "/actionQuery/transferAsset")
            })
            .await?;
        Ok(action)
    }

    /// Hex-encoded unsigned transaction built by the node.
    pub async fn unsigned_tx(
        &self,
        public_key_hex: &str,
        plain_value_hex: &str,
        nonce: u64,
    ) -> WalletResult<String> {
        let variables = json!({
            "publicKey": public_key_hex,
            "plainValue": plain_value_hex,
            "nonce": nonce,
            "maxGasPrice": { "quantity": 1, "ticker": "Mead", "decimalPlaces": 18 },
        });
        let (tx, _) = self
            .query(UNSIGNED_TX_QUERY, variables, |data| {
                string_field(data, "/transaction/unsignedTransaction")
            })
            .await?;
        Ok(tx)
    }

    pub async fn stage_tx(&self, payload_hex: &str) -> WalletResult<StagedTx> {
        let (tx_id, endpoint) = self
            .query(STAGE_TX_MUTATION, json!({ "payload": payload_hex }), |data| {
                string_field(data, "/stageTransaction")
            })
            .await?;
        Ok(StagedTx { tx_id, endpoint })
    }

    /// Status as seen by `endpoint`, the node that staged the transaction.
    pub async fn transaction_status(&self, tx_id: &str, endpoint: &str) -> WalletResult<TxStatus> {
        let data = self
            .transport
            .execute(endpoint, TX_STATUS_QUERY, json!({ "txId": tx_id }))
            .await?;
        let raw = string_field(&data, "/transaction/transactionResult/txStatus")?;
        TxStatus::from_chain(&raw)
            .ok_or_else(|| RpcError::MalformedResponse(format!("unknown txStatus `{raw}`")).into())
    }
}

async fn last_block_index_at(
    transport: &dyn GraphqlTransport,
    endpoint: &str,
) -> Result<u64, RpcError> {
    let data = transport
        .execute(endpoint, LAST_BLOCK_INDEX_QUERY, json!({ "offset": 0 }))
        .await?;
    u64_field(&data, "/chainQuery/blockQuery/blocks/0/index")
}
