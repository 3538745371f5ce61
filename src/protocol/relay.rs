// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Stateless relay between a page and the dispatcher.
//!
//! The relay owns no per-request state. It stamps page requests with the
//! origin it was created for (never one claimed by the page), forwards them
//! over a port, and turns port traffic back into page envelopes. When the
//! port drops it reconnects and keeps going.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::wire::{MessageSource, PortHandle, PortRequest, WireMessage};
use crate::error::WalletResult;

const RECONNECT_BASE_DELAY: Duration = Duration::from_millis(100);
const RECONNECT_MAX_DELAY: Duration = Duration::from_secs(5);

/// Opens ports to the dispatcher.
#[async_trait]
pub trait PortConnector: Send + Sync {
    async fn connect(&self) -> WalletResult<PortHandle>;
}

/// Target component for a page method.
fn target_for(method: &str) -> &'static str {
    match method {
        "getCurrentNetwork" | "switchNetwork" => "network",
        _ => "wallet",
    }
}

pub struct Relay<C> {
    origin: String,
    connector: C,
}

impl<C: PortConnector> Relay<C> {
    pub fn new(origin: impl Into<String>, connector: C) -> Self {
        Self {
            origin: origin.into(),
            connector,
        }
    }

    fn to_port(&self, message: WireMessage) -> Option<PortRequest> {
        if message.source != MessageSource::FromPage {
            return None;
        }
        let message_id = message.message_id?;
        let method = message.method?;
        Some(PortRequest {
            action: target_for(&method).to_string(),
            method,
            params: message.params.unwrap_or_default(),
            message_id,
            origin: Some(self.origin.clone()),
        })
    }

    /// Connect, retrying with backoff until it works or shutdown.
    async fn connect(&self, shutdown: &CancellationToken) -> Option<PortHandle> {
        let mut delay = RECONNECT_BASE_DELAY;
        loop {
            match self.connector.connect().await {
                Ok(port) => return Some(port),
                Err(e) => {
                    tracing::warn!(
                        origin = %self.origin,
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "Port connect failed"
                    );
                }
            }
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(RECONNECT_MAX_DELAY);
        }
    }

    /// Pump messages until the page goes away or `shutdown` fires.
    pub async fn run(
        self,
        mut from_page: mpsc::UnboundedReceiver<WireMessage>,
        to_page: mpsc::UnboundedSender<WireMessage>,
        shutdown: CancellationToken,
    ) {
        tracing::info!(origin = %self.origin, "Relay started");
        let Some(mut port) = self.connect(&shutdown).await else {
            return;
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,

                message = from_page.recv() => {
                    let Some(message) = message else { break };
                    let Some(request) = self.to_port(message) else { continue };
                    if let Err(failed) = port.requests.send(request).await {
                        tracing::warn!(origin = %self.origin, "Port closed while sending, reconnecting");
                        let Some(fresh) = self.connect(&shutdown).await else { break };
                        port = fresh;
                        if port.requests.send(failed.0).await.is_err() {
                            tracing::warn!(origin = %self.origin, "Request lost on fresh port");
                        }
                    }
                }

                message = port.messages.recv() => match message {
                    Some(message) => {
                        if to_page.send(message.into_wire()).is_err() {
                            break;
                        }
                    }
                    None => {
                        tracing::warn!(origin = %self.origin, "Port disconnected, reconnecting");
                        let Some(fresh) = self.connect(&shutdown).await else { break };
                        port = fresh;
                    }
                },
            }
        }
        tracing::info!(origin = %self.origin, "Relay stopped");
    }
}
