// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message envelopes.
//!
//! Two hops carry messages:
//!
//! | Hop | Type | Shape |
//! |-----|------|-------|
//! | page <-> relay | [`WireMessage`] | `{type, messageId?, method?, params?, origin?, result?, error?, event?, data?}` |
//! | relay/UI <-> dispatcher | [`PortRequest`] / [`PortMessage`] | `{action, method, params, messageId, origin?}` / `{messageId, result}` etc. |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use super::events::WalletEvent;
use crate::error::WireError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageSource {
    FromPage,
    FromExtension,
}

/// Envelope exchanged between the page and the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub source: MessageSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl WireMessage {
    fn empty(source: MessageSource) -> Self {
        Self {
            source,
            message_id: None,
            method: None,
            params: None,
            origin: None,
            result: None,
            error: None,
            event: None,
            data: None,
        }
    }

    pub fn request(message_id: u64, method: &str, params: Value) -> Self {
        Self {
            message_id: Some(message_id),
            method: Some(method.to_string()),
            params: Some(params),
            ..Self::empty(MessageSource::FromPage)
        }
    }

    pub fn response(message_id: u64, outcome: Result<Value, WireError>) -> Self {
        let mut message = Self {
            message_id: Some(message_id),
            ..Self::empty(MessageSource::FromExtension)
        };
        match outcome {
            Ok(result) => message.result = Some(result),
            Err(error) => message.error = Some(error),
        }
        message
    }

    pub fn event(event: WalletEvent) -> Self {
        Self {
            event: Some(event.event),
            data: Some(event.data),
            ..Self::empty(MessageSource::FromExtension)
        }
    }
}

/// Request sent over a port to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRequest {
    /// Component to address; resolved by the dispatcher
    pub action: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
    pub message_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Anything the dispatcher sends back over a port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortMessage {
    Failure {
        #[serde(rename = "messageId")]
        message_id: u64,
        error: WireError,
    },
    Response {
        #[serde(rename = "messageId")]
        message_id: u64,
        result: Value,
    },
    Event(WalletEvent),
}

impl PortMessage {
    pub fn reply(message_id: u64, outcome: Result<Value, WireError>) -> Self {
        match outcome {
            Ok(result) => PortMessage::Response { message_id, result },
            Err(error) => PortMessage::Failure { message_id, error },
        }
    }

    /// Convert for delivery to the page.
    pub fn into_wire(self) -> WireMessage {
        match self {
            PortMessage::Failure { message_id, error } => {
                WireMessage::response(message_id, Err(error))
            }
            PortMessage::Response { message_id, result } => {
                WireMessage::response(message_id, Ok(result))
            }
            PortMessage::Event(event) => WireMessage::event(event),
        }
    }
}

/// Who is on the other end of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Untrusted page, reached through a relay
    Page,
    /// The wallet's own UI
    Privileged,
}

/// Both directions of an open port.
pub struct PortHandle {
    pub requests: mpsc::Sender<PortRequest>,
    pub messages: mpsc::Receiver<PortMessage>,
}
