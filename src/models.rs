// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Data Models
//!
//! Records persisted by the wallet and returned over the message channel.
//! All types serialize as camelCase JSON.
//!
//! ## Model Categories
//!
//! - **Accounts**: the user's addresses and their derivation
//! - **Pending transactions**: staged transfers per signer
//! - **Connected sites**: origins and the addresses they may see

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Accounts
// =============================================================================

/// An account visible in the wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub name: String,
    /// Derivation index for sequential accounts, 0 for imported ones.
    pub index: u32,
    /// Checksummed address.
    pub address: String,
    /// The seed account sequential accounts derive from.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub primary: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub imported: bool,
}

impl Account {
    pub fn matches(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// Secret key material stored in the secure tier under `ew{address}`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum KeyMaterial {
    /// Seed phrase plus the derivation index of this account.
    Mnemonic { phrase: String, index: u32 },
    PrivateKey { hex: String },
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyMaterial::Mnemonic { index, .. } => write!(f, "Mnemonic {{ index: {index}, .. }}"),
            KeyMaterial::PrivateKey { .. } => f.write_str("PrivateKey { .. }"),
        }
    }
}

// =============================================================================
// Pending Transactions
// =============================================================================

/// Chain-reported status of a staged transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxStatus {
    /// Accepted by an endpoint, not yet seen in a block
    #[default]
    Staging,
    Included,
    Success,
    Failure,
    Invalid,
}

impl TxStatus {
    /// Parse the `txStatus` value reported by the chain.
    pub fn from_chain(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STAGING" => Some(TxStatus::Staging),
            "INCLUDED" => Some(TxStatus::Included),
            "SUCCESS" => Some(TxStatus::Success),
            "FAILURE" => Some(TxStatus::Failure),
            "INVALID" => Some(TxStatus::Invalid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferData {
    pub sender: String,
    pub receiver: String,
    pub amount: String,
}

/// A staged transfer kept for the activity view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    /// Transaction id returned by the staging endpoint
    pub id: String,
    /// Endpoint that accepted the transaction; status is polled there
    pub endpoint: String,
    pub status: TxStatus,
    #[serde(rename = "type")]
    pub kind: String,
    pub signer: String,
    /// Unix milliseconds
    pub timestamp: i64,
    pub data: TransferData,
}

// =============================================================================
// Connected Sites
// =============================================================================

/// Origin → addresses the origin may see.
pub type ConnectedSites = BTreeMap<String, Vec<String>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_flags_are_omitted_when_false() {
        let account = Account {
            name: "Account 1".into(),
            index: 0,
            address: "0xAbC".into(),
            primary: false,
            imported: false,
        };
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("primary").is_none());
        assert!(account.matches("0xabc"));
    }

    #[test]
    fn pending_transaction_shape() {
        let tx = PendingTransaction {
            id: "tx1".into(),
            endpoint: "https://rpc".into(),
            status: TxStatus::Staging,
            kind: "transfer_asset5".into(),
            signer: "0x1".into(),
            timestamp: 1,
            data: TransferData {
                sender: "0x1".into(),
                receiver: "0x2".into(),
                amount: "1.5".into(),
            },
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["status"], "STAGING");
        assert_eq!(json["type"], "transfer_asset5");
    }

    #[test]
    fn chain_status_parsing() {
        assert_eq!(TxStatus::from_chain("SUCCESS"), Some(TxStatus::Success));
        assert_eq!(TxStatus::from_chain("included"), Some(TxStatus::Included));
        assert_eq!(TxStatus::from_chain("???"), None);
    }
}
