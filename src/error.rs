// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy shared by every wallet component.
//!
//! Layer-specific errors (`StorageError`, `CipherError`, `RpcError`,
//! `CodecError`, `SignerError`) convert into [`WalletError`], which is the
//! only error type that crosses the message boundary. On the wire it is
//! flattened into a [`WireError`] carrying a stable `code`.

use serde::{Deserialize, Serialize};

use crate::blockchain::bencodex::CodecError;
use crate::rpc::{EndpointFailure, RpcError};
use crate::storage::{CipherError, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    /// A record was read through the accessor of the other tier.
    #[error("record `{0}` belongs to the other storage tier")]
    AccessViolation(String),

    #[error("failed to decrypt stored value: {0}")]
    DecryptError(#[from] CipherError),

    #[error("invalid action: {0}")]
    InvalidAction(String),

    #[error("nonce {given} is not the last nonce issued for {address}")]
    InvalidNonce { address: String, given: u64 },

    #[error("request rejected by user")]
    UserRejected,

    #[error("approval request `{0}` already exists")]
    DuplicateRequest(String),

    /// Missing, wrong-tier or undecryptable key material.
    #[error("no usable key material for {0}")]
    KeyNotFound(String),

    /// Every endpoint failed; failures are kept in call order.
    #[error("all {} endpoints failed", .0.len())]
    AllEndpointsFailed(Vec<EndpointFailure>),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    #[error("not signed in")]
    NotSignedIn,

    #[error("invalid params: {0}")]
    InvalidParams(String),

    #[error("invalid passphrase")]
    InvalidPassphrase,

    #[error("origin `{0}` is not connected")]
    NotConnected(String),

    #[error("approval request `{0}` not found")]
    ApprovalNotFound(String),

    #[error("network `{0}` not found")]
    NetworkNotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type WalletResult<T> = Result<T, WalletError>;

impl WalletError {
    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            WalletError::AccessViolation(_) => "access_violation",
            WalletError::DecryptError(_) => "decrypt_error",
            WalletError::InvalidAction(_) => "invalid_action",
            WalletError::InvalidNonce { .. } => "invalid_nonce",
            WalletError::UserRejected => "user_rejected",
            WalletError::DuplicateRequest(_) => "duplicate_request",
            WalletError::KeyNotFound(_) => "key_not_found",
            WalletError::AllEndpointsFailed(_) => "all_endpoints_failed",
            WalletError::UnknownMethod(_) => "unknown_method",
            WalletError::NotSignedIn => "not_signed_in",
            WalletError::InvalidParams(_) => "invalid_params",
            WalletError::InvalidPassphrase => "invalid_passphrase",
            WalletError::NotConnected(_) => "not_connected",
            WalletError::ApprovalNotFound(_) => "approval_not_found",
            WalletError::NetworkNotFound(_) => "network_not_found",
            WalletError::Storage(_) => "storage_error",
            WalletError::Rpc(_) => "rpc_error",
            WalletError::Serde(_) => "serialization_error",
            WalletError::Internal(_) => "internal_error",
        }
    }
}

impl From<CodecError> for WalletError {
    fn from(e: CodecError) -> Self {
        WalletError::InvalidAction(e.to_string())
    }
}

/// Error payload carried in `{messageId, error}` replies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireError {
    pub code: String,
    pub message: String,
}

impl WireError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&WalletError> for WireError {
    fn from(e: &WalletError) -> Self {
        Self::new(e.error_code(), e.to_string())
    }
}

impl From<WalletError> for WireError {
    fn from(e: WalletError) -> Self {
        Self::from(&e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_error_carries_code_and_message() {
        let wire = WireError::from(WalletError::UnknownMethod("mint".into()));
        assert_eq!(wire.code, "unknown_method");
        assert_eq!(wire.message, "unknown method `mint`");
    }

    #[test]
    fn aggregate_error_reports_endpoint_count() {
        let err = WalletError::AllEndpointsFailed(vec![
            EndpointFailure::new("https://a", RpcError::Http("timeout".into())),
            EndpointFailure::new("https://b", RpcError::Http("refused".into())),
        ]);
        assert_eq!(err.to_string(), "all 2 endpoints failed");
        assert_eq!(err.error_code(), "all_endpoints_failed");
    }

    #[test]
    fn codec_errors_become_invalid_action() {
        let err: WalletError = CodecError::TrailingBytes(3).into();
        assert!(matches!(err, WalletError::InvalidAction(_)));
    }
}
