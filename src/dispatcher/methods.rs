// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capability sets.
//!
//! Every callable method is a variant of a closed enum, one enum per
//! component and caller. A method name that does not parse into the set
//! for its caller is `UnknownMethod`, whether or not the component
//! implements it for someone else.
//!
//! ## Page callers
//!
//! | Action | Methods |
//! |--------|---------|
//! | `wallet` | `sign`, `signTx`, `listAccounts`, `getPublicKey`, `connect`, `isConnected` |
//! | `network` | `getCurrentNetwork`, `switchNetwork` |
//!
//! ## Privileged callers
//!
//! `wallet`, `network`, `confirmation`, `graphql`, `storage`, `passphrase`
//! and `hasWallet`. All but `passphrase` and `hasWallet` need a session.

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;

use crate::error::{WalletError, WalletResult};
use crate::protocol::PortKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Target {
    Wallet,
    Network,
    Confirmation,
    Graphql,
    Storage,
    Passphrase,
    HasWallet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageWalletMethod {
    Sign,
    SignTx,
    ListAccounts,
    GetPublicKey,
    Connect,
    IsConnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageNetworkMethod {
    GetCurrentNetwork,
    SwitchNetwork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WalletMethod {
    CreatePrimaryWallet,
    CreateSequentialWallet,
    CreatePrivateKeyWallet,
    RenameAccount,
    DeleteAccount,
    GetCurrentAccount,
    SelectAccount,
    #[serde(alias = "sendNCG")]
    SendAsset,
    NextNonce,
    GetPrivateKey,
    Sign,
    SignTx,
    GetApprovalRequests,
    ApproveRequest,
    RejectRequest,
    ListAccounts,
    GetPublicKey,
    ListTransactions,
    RefreshTransactionStatus,
    Disconnect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkMethod {
    GetCurrentNetwork,
    SwitchNetwork,
    ListNetworks,
    ImportNetwork,
    UpdateNetwork,
    DeleteNetwork,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmationMethod {
    GetAll,
    Approve,
    Reject,
    HasApprovalRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphqlMethod {
    GetLastBlockIndex,
    GetBalance,
    GetNextTxNonce,
    GetTransferAsset,
    GetTransactionStatus,
}

/// No `secureGet`: secure records are never returned over a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageMethod {
    Set,
    Get,
    Remove,
    Has,
    SecureSet,
    ClearAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassphraseMethod {
    Initialize,
    Set,
    #[serde(rename = "checkTTL")]
    CheckTtl,
    Remove,
    IsSignedIn,
    IsValid,
}

/// A resolved `(caller, action, method)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    PageWallet(PageWalletMethod),
    PageNetwork(PageNetworkMethod),
    Wallet(WalletMethod),
    Network(NetworkMethod),
    Confirmation(ConfirmationMethod),
    Graphql(GraphqlMethod),
    Storage(StorageMethod),
    Passphrase(PassphraseMethod),
    HasWallet,
}

impl Capability {
    /// Resolve against the set allowed for `kind`.
    pub fn resolve(kind: PortKind, action: &str, method: &str) -> WalletResult<Self> {
        let unknown = || WalletError::UnknownMethod(format!("{action}.{method}"));
        let target: Target = parse_name(action).map_err(|_| unknown())?;

        let capability = match (kind, target) {
            (PortKind::Page, Target::Wallet) => Capability::PageWallet(parse_name(method)?),
            (PortKind::Page, Target::Network) => Capability::PageNetwork(parse_name(method)?),
            (PortKind::Page, _) => return Err(unknown()),
            (PortKind::Privileged, Target::Wallet) => Capability::Wallet(parse_name(method)?),
            (PortKind::Privileged, Target::Network) => Capability::Network(parse_name(method)?),
            (PortKind::Privileged, Target::Confirmation) => {
                Capability::Confirmation(parse_name(method)?)
            }
            (PortKind::Privileged, Target::Graphql) => Capability::Graphql(parse_name(method)?),
            (PortKind::Privileged, Target::Storage) => Capability::Storage(parse_name(method)?),
            (PortKind::Privileged, Target::Passphrase) => {
                Capability::Passphrase(parse_name(method)?)
            }
            (PortKind::Privileged, Target::HasWallet) => Capability::HasWallet,
        };
        Ok(capability)
    }

    /// Whether the call needs an unlocked session before it runs.
    ///
    /// Page calls resolve the session lazily inside the operation instead,
    /// so `connect` and `isConnected` work while the wallet is locked.
    pub fn requires_session(&self) -> bool {
        !matches!(
            self,
            Capability::PageWallet(_)
                | Capability::PageNetwork(_)
                | Capability::Passphrase(_)
                | Capability::HasWallet
        )
    }
}

fn parse_name<M: DeserializeOwned>(name: &str) -> WalletResult<M> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| WalletError::UnknownMethod(name.to_string()))
}

/// Decode positional params. A missing `params` reads as `[]`.
pub fn params<T: DeserializeOwned>(params: Value) -> WalletResult<T> {
    let params = if params.is_null() {
        Value::Array(Vec::new())
    } else {
        params
    };
    serde_json::from_value(params).map_err(|e| WalletError::InvalidParams(e.to_string()))
}

/// Positional params where trailing arguments may be omitted.
pub fn loose_params(params: Value) -> WalletResult<Vec<Value>> {
    match params {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        other => Err(WalletError::InvalidParams(format!(
            "params must be an array, got {other}"
        ))),
    }
}

/// An amount given as a JSON string or number.
pub fn amount_string(value: &Value) -> WalletResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(WalletError::InvalidParams(format!("invalid amount {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_sets_are_narrow() {
        assert_eq!(
            Capability::resolve(PortKind::Page, "wallet", "sign").unwrap(),
            Capability::PageWallet(PageWalletMethod::Sign)
        );
        for (action, method) in [
            ("wallet", "getPrivateKey"),
            ("wallet", "sendNCG"),
            ("network", "deleteNetwork"),
            ("storage", "get"),
            ("passphrase", "set"),
            ("wallet", "constructor"),
        ] {
            assert!(
                matches!(
                    Capability::resolve(PortKind::Page, action, method),
                    Err(WalletError::UnknownMethod(_))
                ),
                "{action}.{method} must not be reachable from a page"
            );
        }
    }

    #[test]
    fn privileged_names_and_aliases() {
        assert_eq!(
            Capability::resolve(PortKind::Privileged, "wallet", "sendNCG").unwrap(),
            Capability::Wallet(WalletMethod::SendAsset)
        );
        assert_eq!(
            Capability::resolve(PortKind::Privileged, "passphrase", "checkTTL").unwrap(),
            Capability::Passphrase(PassphraseMethod::CheckTtl)
        );
        assert_eq!(
            Capability::resolve(PortKind::Privileged, "hasWallet", "").unwrap(),
            Capability::HasWallet
        );
        assert!(matches!(
            Capability::resolve(PortKind::Privileged, "storage", "secureGet"),
            Err(WalletError::UnknownMethod(_))
        ));
        assert!(matches!(
            Capability::resolve(PortKind::Privileged, "kernel", "exec"),
            Err(WalletError::UnknownMethod(_))
        ));
    }

    #[test]
    fn session_requirements() {
        let resolve = |action, method| Capability::resolve(PortKind::Privileged, action, method);
        assert!(resolve("wallet", "listAccounts").unwrap().requires_session());
        assert!(resolve("storage", "get").unwrap().requires_session());
        assert!(!resolve("passphrase", "isSignedIn").unwrap().requires_session());
        assert!(!resolve("hasWallet", "").unwrap().requires_session());
    }

    #[test]
    fn positional_params() {
        let (address, index): (String, u32) = params(json!(["0xabc", 2])).unwrap();
        assert_eq!((address.as_str(), index), ("0xabc", 2));
        assert!(matches!(
            params::<(String,)>(json!([])),
            Err(WalletError::InvalidParams(_))
        ));
        assert_eq!(loose_params(Value::Null).unwrap(), Vec::<Value>::new());
        assert_eq!(amount_string(&json!(10)).unwrap(), "10");
        assert_eq!(amount_string(&json!("1.5")).unwrap(), "1.5");
    }
}
