// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Signing Pipeline
//!
//! Turns a caller's request into a signed transaction:
//!
//! ```text
//! Requested -> Approving -> Building -> Signing -> Broadcasting -> Staged
//!                  |
//!                  +-> Denied (UserRejected, no key access, no nonce used)
//! ```
//!
//! `sign` and `sign_tx` stop after signing and hand the hex back to the
//! caller. `send_asset` goes all the way to staging and records the result
//! in the signer's history.
//!
//! ## Nonces
//!
//! `next_nonce` asks the chain and remembers the answer per address.
//! `send_asset` only accepts the remembered nonce, so a page cannot replay
//! or skip one. Everything that consumes a nonce for a signer runs under
//! that signer's lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use alloy::hex;
use chrono::Utc;
use serde_json::json;
use tokio::sync::OwnedMutexGuard;

use crate::approval::{ApprovalCategory, ApprovalQueue};
use crate::blockchain::bencodex::{self, to_display_json, Value};
use crate::blockchain::transactions::{
    address_bytes, attach_signature, default_max_gas_price, gas_limit_for, UnsignedTx,
};
use crate::blockchain::{parse_amount, AccountSigner, LocalAccount, ASSET_DECIMALS};
use crate::error::{WalletError, WalletResult};
use crate::models::{PendingTransaction, TransferData, TxStatus};
use crate::rpc::{RpcClient, RpcError, RpcPool};
use crate::session::SessionManager;

use super::accounts::AccountRegistry;
use super::history::TxHistory;
use super::network::NetworkController;

const TRANSFER_ACTION_TYPE: &str = "transfer_asset5";

/// One async mutex per key, created on first use.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(key.to_ascii_lowercase()).or_default())
        };
        lock.lock_owned().await
    }
}

pub struct SigningPipeline {
    session: Arc<SessionManager>,
    accounts: Arc<AccountRegistry>,
    networks: Arc<NetworkController>,
    approvals: Arc<ApprovalQueue>,
    rpc: Arc<RpcPool>,
    history: Arc<TxHistory>,
    signer_locks: KeyedLocks,
    /// Last nonce handed out per lowercase address
    issued_nonces: Mutex<HashMap<String, u64>>,
}

impl SigningPipeline {
    pub fn new(
        session: Arc<SessionManager>,
        accounts: Arc<AccountRegistry>,
        networks: Arc<NetworkController>,
        approvals: Arc<ApprovalQueue>,
        rpc: Arc<RpcPool>,
        history: Arc<TxHistory>,
    ) -> Self {
        Self {
            session,
            accounts,
            networks,
            approvals,
            rpc,
            history,
            signer_locks: KeyedLocks::default(),
            issued_nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Client for the current network.
    pub async fn client(&self) -> WalletResult<Arc<RpcClient>> {
        let network = self.networks.get_current_network()?;
        Ok(self.rpc.client_for(&network).await)
    }

    fn issued_nonce(&self, address: &str) -> Option<u64> {
        self.issued_nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&address.to_ascii_lowercase())
            .copied()
    }

    fn record_nonce(&self, address: &str, nonce: Option<u64>) {
        let mut nonces = self
            .issued_nonces
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let key = address.to_ascii_lowercase();
        match nonce {
            Some(nonce) => nonces.insert(key, nonce),
            None => nonces.remove(&key),
        };
    }

    /// Ask the chain for the next nonce and remember it as issued.
    pub async fn next_nonce(&self, address: &str) -> WalletResult<u64> {
        let nonce = self.client().await?.next_tx_nonce(address).await?;
        self.record_nonce(address, Some(nonce));
        tracing::debug!(address, nonce, "Nonce issued");
        Ok(nonce)
    }

    /// Build and sign a transaction around one action after user approval.
    ///
    /// Returns the signed transaction as hex. Nothing is staged.
    pub async fn sign(&self, signer: &str, action_hex: &str) -> WalletResult<String> {
        let (_, action) = decode_dictionary(action_hex)?;
        self.session.require_signed_in()?;

        self.approvals
            .request(
                ApprovalCategory::Sign,
                json!({ "signer": signer, "content": to_display_json(&action) }),
            )
            .await?;

        let _guard = self.signer_locks.lock(signer).await;
        let key = self.accounts.load_signer(signer)?;
        let network = self.networks.get_current_network()?;
        let genesis_hash = hex::decode(&network.genesis_hash).map_err(|e| {
            WalletError::Internal(format!("genesis hash of {}: {e}", network.id))
        })?;
        let address = key.address();
        let signer_bytes = address_bytes(&address)
            .ok_or_else(|| WalletError::Internal(format!("malformed address {address}")))?;
        let nonce = self.next_nonce(&address).await?;

        let unsigned = UnsignedTx {
            signer: signer_bytes,
            gas_limit: gas_limit_for(&action),
            actions: vec![action],
            nonce,
            genesis_hash,
            public_key: key.public_key(),
            timestamp: Utc::now(),
            max_gas_price: default_max_gas_price(),
        };
        let signed = sign_envelope(&key, unsigned.to_value())?;

        tracing::info!(signer = %address, nonce, "Transaction signed");
        Ok(hex::encode(bencodex::encode(&signed)))
    }

    /// Sign a caller-built unsigned transaction after user approval.
    ///
    /// The signature covers the caller's bytes exactly as sent.
    pub async fn sign_tx(&self, signer: &str, unsigned_tx_hex: &str) -> WalletResult<String> {
        let (unsigned_bytes, unsigned) = decode_dictionary(unsigned_tx_hex)?;
        self.session.require_signed_in()?;

        self.approvals
            .request(
                ApprovalCategory::Sign,
                json!({ "signer": signer, "content": to_display_json(&unsigned) }),
            )
            .await?;

        let _guard = self.signer_locks.lock(signer).await;
        let key = self.accounts.load_signer(signer)?;
        let signature = key
            .sign(&unsigned_bytes)
            .map_err(|e| WalletError::Internal(e.to_string()))?;
        let signed = attach_signature(unsigned, signature)
            .ok_or_else(|| WalletError::InvalidAction("expected a Bencodex dictionary".into()))?;

        tracing::info!(signer, "Unsigned transaction signed");
        Ok(hex::encode(bencodex::encode(&signed)))
    }

    /// Transfer `amount` from `sender` to `receiver` and stage it.
    ///
    /// `nonce` must be the one last returned by [`Self::next_nonce`] for
    /// `sender`; anything else fails before any network traffic.
    pub async fn send_asset(
        &self,
        sender: &str,
        receiver: &str,
        amount: &str,
        nonce: u64,
    ) -> WalletResult<PendingTransaction> {
        parse_amount(amount, ASSET_DECIMALS).map_err(WalletError::InvalidParams)?;

        let _guard = self.signer_locks.lock(sender).await;
        if self.issued_nonce(sender) != Some(nonce) {
            tracing::warn!(sender, nonce, "Rejected transfer with unexpected nonce");
            return Err(WalletError::InvalidNonce {
                address: sender.to_string(),
                given: nonce,
            });
        }

        let key = self.accounts.load_signer(sender)?;
        let client = self.client().await?;
        let action = client
            .transfer_asset(&key.address(), receiver, amount)
            .await?;
        let unsigned_hex = client
            .unsigned_tx(&hex::encode(key.public_key()), &action, nonce)
            .await?;

        let unsigned_bytes = hex::decode(unsigned_hex.trim()).map_err(|e| {
            RpcError::MalformedResponse(format!("unsigned transaction is not hex: {e}"))
        })?;
        let unsigned = bencodex::decode(&unsigned_bytes).map_err(|e| {
            RpcError::MalformedResponse(format!("unsigned transaction: {e}"))
        })?;
        let signature = key
            .sign(&unsigned_bytes)
            .map_err(|e| WalletError::Internal(e.to_string()))?;
        let signed = attach_signature(unsigned, signature).ok_or_else(|| {
            RpcError::MalformedResponse("unsigned transaction is not a dictionary".into())
        })?;

        let staged = client.stage_tx(&hex::encode(bencodex::encode(&signed))).await?;
        self.record_nonce(sender, None);

        let record = PendingTransaction {
            id: staged.tx_id,
            endpoint: staged.endpoint,
            status: TxStatus::Staging,
            kind: TRANSFER_ACTION_TYPE.to_string(),
            signer: sender.to_string(),
            timestamp: Utc::now().timestamp_millis(),
            data: TransferData {
                sender: sender.to_string(),
                receiver: receiver.to_string(),
                amount: amount.to_string(),
            },
        };
        self.history.push(record.clone())?;

        tracing::info!(
            tx_id = %record.id,
            endpoint = %record.endpoint,
            sender,
            "Transfer staged"
        );
        Ok(record)
    }

    /// Poll the staging endpoint for a recorded transaction and store the result.
    pub async fn refresh_status(&self, signer: &str, tx_id: &str) -> WalletResult<PendingTransaction> {
        let tx = self
            .history
            .list(signer)?
            .into_iter()
            .find(|tx| tx.id == tx_id)
            .ok_or_else(|| WalletError::InvalidParams(format!("unknown transaction {tx_id}")))?;
        let status = self
            .client()
            .await?
            .transaction_status(&tx.id, &tx.endpoint)
            .await?;
        self.history.update_status(signer, tx_id, status)
    }
}

/// Decode caller hex into a dictionary, keeping the raw bytes.
fn decode_dictionary(input_hex: &str) -> WalletResult<(Vec<u8>, Value)> {
    let bytes = hex::decode(input_hex.trim())
        .map_err(|e| WalletError::InvalidAction(format!("not hex: {e}")))?;
    let value = bencodex::decode(&bytes)?;
    if value.as_dictionary().is_none() {
        return Err(WalletError::InvalidAction(
            "expected a Bencodex dictionary".into(),
        ));
    }
    Ok((bytes, value))
}

fn sign_envelope(key: &LocalAccount, unsigned: Value) -> WalletResult<Value> {
    let signature = key
        .sign(&bencodex::encode(&unsigned))
        .map_err(|e| WalletError::Internal(e.to_string()))?;
    attach_signature(unsigned, signature)
        .ok_or_else(|| WalletError::InvalidAction("expected a Bencodex dictionary".into()))
}
