// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Page-side client.
//!
//! Each call gets the next `messageId` of this client and parks a waiter
//! under it. Replies are matched on `messageId` only, so they may arrive in
//! any order. A caller that stops waiting (its future is dropped) removes
//! its own entry; a late reply for it is ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::wire::{MessageSource, WireMessage};
use crate::error::WireError;

type Waiter = oneshot::Sender<Result<Value, WireError>>;

struct Inner {
    next_id: AtomicU64,
    pending: Mutex<HashMap<u64, Waiter>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<Value>>>>,
    outbound: mpsc::UnboundedSender<WireMessage>,
}

impl Inner {
    fn pending(&self) -> MutexGuard<'_, HashMap<u64, Waiter>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribers(&self) -> MutexGuard<'_, HashMap<String, Vec<mpsc::UnboundedSender<Value>>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deliver(&self, message: WireMessage) {
        if message.source != MessageSource::FromExtension {
            return;
        }
        match (message.message_id, message.event) {
            (Some(id), _) => {
                let Some(waiter) = self.pending().remove(&id) else {
                    tracing::debug!(message_id = id, "Reply for unknown or abandoned call");
                    return;
                };
                let outcome = match message.error {
                    Some(error) => Err(error),
                    None => Ok(message.result.unwrap_or(Value::Null)),
                };
                let _ = waiter.send(outcome);
            }
            (None, Some(event)) => {
                let data = message.data.unwrap_or(Value::Null);
                if let Some(subscribers) = self.subscribers().get_mut(&event) {
                    subscribers.retain(|tx| tx.send(data.clone()).is_ok());
                }
            }
            (None, None) => tracing::debug!("Ignoring message without id or event"),
        }
    }
}

/// Removes the pending entry if the call is abandoned before its reply.
struct PendingGuard<'a> {
    inner: &'a Inner,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.inner.pending().remove(&self.id);
    }
}

fn disconnected() -> WireError {
    WireError::new("disconnected", "wallet connection closed")
}

#[derive(Clone)]
pub struct PageClient {
    inner: Arc<Inner>,
}

impl PageClient {
    /// Start a client posting to `outbound` and reading replies from `inbound`.
    pub fn spawn(
        outbound: mpsc::UnboundedSender<WireMessage>,
        mut inbound: mpsc::UnboundedReceiver<WireMessage>,
        shutdown: CancellationToken,
    ) -> Self {
        let inner = Arc::new(Inner {
            next_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
            outbound,
        });

        let reader = Arc::clone(&inner);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    message = inbound.recv() => match message {
                        Some(message) => reader.deliver(message),
                        None => break,
                    },
                }
            }
            // fail whoever is still waiting
            reader.pending().clear();
        });

        Self { inner }
    }

    /// Call `method` and wait for its reply.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, WireError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.inner.pending().insert(id, tx);
        let _guard = PendingGuard {
            inner: &self.inner,
            id,
        };

        self.inner
            .outbound
            .send(WireMessage::request(id, method, params))
            .map_err(|_| disconnected())?;

        rx.await.unwrap_or_else(|_| Err(disconnected()))
    }

    /// Receive the `data` of every future `event` broadcast.
    pub fn subscribe(&self, event: &str) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers()
            .entry(event.to_string())
            .or_default()
            .push(tx);
        rx
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.pending().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> (
        PageClient,
        mpsc::UnboundedReceiver<WireMessage>,
        mpsc::UnboundedSender<WireMessage>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let client = PageClient::spawn(out_tx, in_rx, CancellationToken::new());
        (client, out_rx, in_tx)
    }

    #[tokio::test]
    async fn message_ids_strictly_increase() {
        let (client, mut posted, _inbound) = client();
        for _ in 0..3 {
            let client = client.clone();
            tokio::spawn(async move { client.call("isConnected", json!([])).await });
        }

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(posted.recv().await.unwrap().message_id.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn replies_match_by_id_in_any_order() {
        let (client, mut posted, inbound) = client();
        let first = tokio::spawn({
            let client = client.clone();
            async move { client.call("a", json!([])).await }
        });
        let id_a = posted.recv().await.unwrap().message_id.unwrap();
        let second = tokio::spawn({
            let client = client.clone();
            async move { client.call("b", json!([])).await }
        });
        let id_b = posted.recv().await.unwrap().message_id.unwrap();

        inbound
            .send(WireMessage::response(
                id_b,
                Err(WireError::new("user_rejected", "no")),
            ))
            .unwrap();
        inbound
            .send(WireMessage::response(id_a, Ok(json!("A"))))
            .unwrap();

        assert_eq!(first.await.unwrap().unwrap(), json!("A"));
        assert_eq!(second.await.unwrap().unwrap_err().code, "user_rejected");
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn abandoned_call_cleans_up() {
        let (client, mut posted, inbound) = client();
        let call = tokio::spawn({
            let client = client.clone();
            async move { client.call("sign", json!([])).await }
        });
        let id = posted.recv().await.unwrap().message_id.unwrap();
        assert_eq!(client.pending_calls(), 1);

        call.abort();
        let _ = call.await;
        assert_eq!(client.pending_calls(), 0);

        // late reply is dropped quietly
        inbound.send(WireMessage::response(id, Ok(json!(1)))).unwrap();
    }

    #[tokio::test]
    async fn events_fan_out_to_subscribers() {
        let (client, _posted, inbound) = client();
        let mut a = client.subscribe("network:changed");
        let mut b = client.subscribe("network:changed");

        inbound
            .send(WireMessage::event(crate::protocol::events::WalletEvent {
                event: "network:changed".into(),
                data: json!({"id": "0x000000000001"}),
            }))
            .unwrap();

        assert_eq!(a.recv().await.unwrap()["id"], "0x000000000001");
        assert_eq!(b.recv().await.unwrap()["id"], "0x000000000001");
    }
}
