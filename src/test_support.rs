// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared test doubles.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blockchain::bencodex::{self, Key, Value as Bencodex};
use crate::rpc::{GraphqlTransport, RpcError};

type Handler = dyn Fn(&str, &str, &Value) -> Result<Value, RpcError> + Send + Sync;

/// Transport answering from a closure and recording every call.
pub struct MockTransport {
    handler: Box<Handler>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&str, &str, &Value) -> Result<Value, RpcError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `(endpoint, query)` pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls whose query mentions `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, query)| query.contains(needle))
            .count()
    }
}

#[async_trait]
impl GraphqlTransport for MockTransport {
    async fn execute(
        &self,
        endpoint: &str,
        query: &str,
        variables: Value,
    ) -> Result<Value, RpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), query.to_string()));
        (self.handler)(endpoint, query, &variables)
    }
}

/// Hex of a minimal `transfer_asset5` action.
pub fn transfer_action_hex() -> String {
    let mut action = std::collections::BTreeMap::new();
    action.insert(Key::from("type_id"), Bencodex::Text("transfer_asset5".into()));
    action.insert(Key::from("values"), Bencodex::Dictionary(Default::default()));
    alloy::hex::encode(bencodex::encode(&Bencodex::Dictionary(action)))
}

/// Hex of a minimal unsigned transaction dictionary.
pub fn unsigned_tx_hex(nonce: u64) -> String {
    let mut tx = std::collections::BTreeMap::new();
    tx.insert(Key::Binary(vec![b'n']), Bencodex::Integer(i128::from(nonce)));
    tx.insert(Key::Binary(vec![b'a']), Bencodex::List(Vec::new()));
    alloy::hex::encode(bencodex::encode(&Bencodex::Dictionary(tx)))
}

/// A healthy chain: nonce `next_nonce`, staging always succeeds.
pub fn chain_stub(next_nonce: u64) -> Arc<MockTransport> {
    Arc::new(MockTransport::new(move |endpoint, query, vars| {
        if query.contains("blockQuery") {
            Ok(json!({ "chainQuery": { "blockQuery": { "blocks": [{ "index": 100 }] } } }))
        } else if query.contains("nextTxNonce") {
            Ok(json!({ "transaction": { "nextTxNonce": next_nonce } }))
        } else if query.contains("goldBalance") {
            Ok(json!({ "goldBalance": "10.00" }))
        } else if query.contains("transferAsset") {
            Ok(json!({ "actionQuery": { "transferAsset": transfer_action_hex() } }))
        } else if query.contains("unsignedTransaction") {
            let nonce = vars["nonce"].as_u64().unwrap_or_default();
            Ok(json!({ "transaction": { "unsignedTransaction": unsigned_tx_hex(nonce) } }))
        } else if query.contains("stageTransaction") {
            Ok(json!({ "stageTransaction": format!("tx-from-{endpoint}") }))
        } else if query.contains("transactionResult") {
            Ok(json!({ "transaction": { "transactionResult": { "txStatus": "SUCCESS" } } }))
        } else {
            Err(RpcError::Graphql(format!("unexpected query: {query}")))
        }
    }))
}
