// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Persisted key names.
//!
//! ```text
//! passwordChecker      secure  "password" marker for passphrase checks
//! accounts             plain   Vec<Account>
//! ca                   plain   current address
//! ew{address}          secure  key material per account
//! txs{address}         plain   pending transactions, newest first
//! approval_requests    plain   Vec<ApprovalRequest>
//! connected_sites      plain   origin -> authorized addresses
//! n                    plain   Vec<Network>
//! cn                   plain   current network id
//! ```
//!
//! Address-scoped keys are lowercased so lookups are case-insensitive.

pub const PASSWORD_CHECKER: &str = "passwordChecker";

/// Plaintext of the password-check record.
pub const PASSWORD_CHECKER_VALUE: &str = "password";

pub const ACCOUNTS: &str = "accounts";
pub const CURRENT_ADDRESS: &str = "ca";
pub const APPROVAL_REQUESTS: &str = "approval_requests";
pub const CONNECTED_SITES: &str = "connected_sites";
pub const NETWORKS: &str = "n";
pub const CURRENT_NETWORK: &str = "cn";

const ENCRYPTED_WALLET_PREFIX: &str = "ew";
const TXS_PREFIX: &str = "txs";

/// Key material record for an account.
pub fn encrypted_wallet(address: &str) -> String {
    format!("{ENCRYPTED_WALLET_PREFIX}{}", address.to_lowercase())
}

/// Pending-transaction list for a signer.
pub fn transactions(address: &str) -> String {
    format!("{TXS_PREFIX}{}", address.to_lowercase())
}
