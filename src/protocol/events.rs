// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Broadcast events fanned out to every open port.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

pub const NETWORK_CHANGED: &str = "network:changed";
pub const CONNECTED: &str = "connected";
/// Sent to the privileged UI only, carrying the new request.
pub const APPROVAL_REQUESTED: &str = "approval:requested";

const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletEvent {
    pub event: String,
    pub data: Value,
}

/// Cloneable handle to the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WalletEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_BUFFER);
        Self { tx }
    }

    /// Deliver to current subscribers. Having none is not an error.
    pub fn emit(&self, event: &str, data: Value) {
        let delivered = self
            .tx
            .send(WalletEvent {
                event: event.to_string(),
                data,
            })
            .unwrap_or(0);
        tracing::debug!(event, delivered, "Event emitted");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn every_subscriber_receives_events() {
        let bus = EventBus::new();
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.emit(NETWORK_CHANGED, json!({"id": "0x000000000001"}));

        assert_eq!(a.recv().await.unwrap().event, NETWORK_CHANGED);
        assert_eq!(b.recv().await.unwrap().data["id"], "0x000000000001");
    }

    #[test]
    fn emitting_without_subscribers_is_fine() {
        EventBus::new().emit(CONNECTED, json!([]));
    }
}
