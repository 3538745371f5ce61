// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Approval Queue
//!
//! Irreversible operations (signing, connecting a site) wait here for an
//! out-of-band decision from the user.
//!
//! ## State
//!
//! - The durable list under `approval_requests` is the truth for *what* is
//!   pending. Each record carries its own status:
//!   `pending -> approved{metadata} | rejected`.
//! - The in-memory waiter map is the truth for *who* is waiting.
//!
//! A decision taken while nobody is waiting (for example after a restart,
//! or after the caller dropped its [`PendingApproval`]) is recorded in the
//! durable list and delivered to the next [`ApprovalQueue::resume`] for
//! that id.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::{WalletError, WalletResult};
use crate::storage::{keys, SecureStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalCategory {
    Sign,
    Connect,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved {
        metadata: Value,
    },
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: String,
    pub category: ApprovalCategory,
    pub data: Value,
    #[serde(default)]
    pub status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
}

/// Surfaces a new request to the user.
pub trait ApprovalPresenter: Send + Sync {
    fn present(&self, request: &ApprovalRequest);
}

/// Logs new requests. Used when no UI is attached.
pub struct TracingPresenter;

impl ApprovalPresenter for TracingPresenter {
    fn present(&self, request: &ApprovalRequest) {
        tracing::info!(
            id = %request.id,
            category = ?request.category,
            "Approval requested"
        );
    }
}

/// Forwards new requests to a privileged UI channel.
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<ApprovalRequest>,
}

impl ChannelPresenter {
    pub fn new(tx: mpsc::UnboundedSender<ApprovalRequest>) -> Self {
        Self { tx }
    }
}

impl ApprovalPresenter for ChannelPresenter {
    fn present(&self, request: &ApprovalRequest) {
        if self.tx.send(request.clone()).is_err() {
            tracing::warn!(id = %request.id, "Approval UI channel closed");
        }
    }
}

type Decision = WalletResult<Value>;
type WaiterMap = Mutex<HashMap<String, oneshot::Sender<Decision>>>;

/// Handle to a registered request.
///
/// Dropping it unregisters the waiter; the durable record stays pending.
#[derive(Debug)]
pub struct PendingApproval {
    id: String,
    receiver: oneshot::Receiver<Decision>,
    waiters: Weak<WaiterMap>,
}

impl PendingApproval {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the user's decision. No timeout.
    ///
    /// Resolves to the approval metadata, or `UserRejected`.
    pub async fn decision(mut self) -> WalletResult<Value> {
        (&mut self.receiver)
            .await
            .unwrap_or_else(|_| Err(WalletError::Internal("approval queue dropped".into())))
    }
}

impl Drop for PendingApproval {
    fn drop(&mut self) {
        self.receiver.close();
        let Some(waiters) = self.waiters.upgrade() else {
            return;
        };
        let mut waiters = waiters.lock().unwrap_or_else(PoisonError::into_inner);
        // Only our own sender; a later resume may have registered a live one
        if waiters.get(&self.id).is_some_and(|tx| tx.is_closed()) {
            waiters.remove(&self.id);
            tracing::debug!(id = %self.id, "Approval waiter abandoned");
        }
    }
}

/// Durable, restart-safe approval queue.
pub struct ApprovalQueue {
    store: SecureStore,
    presenter: Arc<dyn ApprovalPresenter>,
    waiters: Arc<WaiterMap>,
    // Serializes read-modify-write cycles on the durable list
    list_lock: Mutex<()>,
    id_source: Box<dyn Fn() -> String + Send + Sync>,
}

impl ApprovalQueue {
    pub fn new(store: SecureStore, presenter: Arc<dyn ApprovalPresenter>) -> Self {
        Self {
            store,
            presenter,
            waiters: Arc::new(Mutex::new(HashMap::new())),
            list_lock: Mutex::new(()),
            id_source: Box::new(|| uuid::Uuid::new_v4().simple().to_string()),
        }
    }

    /// Replace the id generator.
    pub fn with_id_source(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.id_source = Box::new(source);
        self
    }

    fn list_guard(&self) -> MutexGuard<'_, ()> {
        self.list_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn waiters(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Decision>>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> WalletResult<Vec<ApprovalRequest>> {
        Ok(self
            .store
            .get::<Vec<ApprovalRequest>>(keys::APPROVAL_REQUESTS)?
            .unwrap_or_default())
    }

    fn save(&self, list: &[ApprovalRequest]) -> WalletResult<()> {
        self.store.set(keys::APPROVAL_REQUESTS, list)
    }

    /// Register a request and present it. The returned handle resolves once
    /// the user decides.
    pub fn submit(&self, category: ApprovalCategory, data: Value) -> WalletResult<PendingApproval> {
        let (tx, receiver) = oneshot::channel();
        let request = {
            let _guard = self.list_guard();
            let mut list = self.load()?;
            let id = (self.id_source)();

            if list.iter().any(|r| r.id == id) || self.waiters().contains_key(&id) {
                tracing::warn!(id = %id, "Approval id collision");
                return Err(WalletError::DuplicateRequest(id));
            }

            let request = ApprovalRequest {
                id,
                category,
                data,
                status: ApprovalStatus::Pending,
                created_at: Utc::now(),
            };
            list.push(request.clone());
            self.save(&list)?;
            self.waiters().insert(request.id.clone(), tx);
            request
        };

        self.presenter.present(&request);

        Ok(PendingApproval {
            id: request.id,
            receiver,
            waiters: Arc::downgrade(&self.waiters),
        })
    }

    /// Submit and wait for the decision.
    pub async fn request(&self, category: ApprovalCategory, data: Value) -> WalletResult<Value> {
        self.submit(category, data)?.decision().await
    }

    pub fn approve(&self, id: &str, metadata: Value) -> WalletResult<()> {
        tracing::info!(id = %id, "Approval granted");
        self.decide(id, ApprovalStatus::Approved { metadata })
    }

    pub fn reject(&self, id: &str) -> WalletResult<()> {
        tracing::info!(id = %id, "Approval rejected");
        self.decide(id, ApprovalStatus::Rejected)
    }

    fn decide(&self, id: &str, status: ApprovalStatus) -> WalletResult<()> {
        let _guard = self.list_guard();
        let mut list = self.load()?;
        let pos = list
            .iter()
            .position(|r| r.id == id && r.status == ApprovalStatus::Pending)
            .ok_or_else(|| WalletError::ApprovalNotFound(id.to_string()))?;

        match self.waiters().remove(id) {
            Some(waiter) => {
                list.remove(pos);
                self.save(&list)?;
                // The caller may have given up; the record is consumed either way
                let _ = waiter.send(into_decision(status));
            }
            None => {
                list[pos].status = status;
                self.save(&list)?;
            }
        }
        Ok(())
    }

    /// Re-attach to a request registered by an earlier instance.
    ///
    /// A decision recorded while nobody was waiting is delivered
    /// immediately and the record is consumed.
    pub fn resume(&self, id: &str) -> WalletResult<PendingApproval> {
        let _guard = self.list_guard();
        let mut list = self.load()?;
        let pos = list
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| WalletError::ApprovalNotFound(id.to_string()))?;

        let (tx, receiver) = oneshot::channel();
        match list[pos].status {
            ApprovalStatus::Pending => {
                let mut waiters = self.waiters();
                if waiters.contains_key(id) {
                    return Err(WalletError::DuplicateRequest(id.to_string()));
                }
                waiters.insert(id.to_string(), tx);
            }
            _ => {
                let record = list.remove(pos);
                self.save(&list)?;
                let _ = tx.send(into_decision(record.status));
            }
        }

        Ok(PendingApproval {
            id: id.to_string(),
            receiver,
            waiters: Arc::downgrade(&self.waiters),
        })
    }

    /// Requests still awaiting a decision.
    pub fn get_all(&self) -> WalletResult<Vec<ApprovalRequest>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|r| r.status == ApprovalStatus::Pending)
            .collect())
    }

    pub fn has_pending(&self) -> WalletResult<bool> {
        Ok(!self.get_all()?.is_empty())
    }
}

fn into_decision(status: ApprovalStatus) -> Decision {
    match status {
        ApprovalStatus::Approved { metadata } => Ok(metadata),
        ApprovalStatus::Rejected => Err(WalletError::UserRejected),
        ApprovalStatus::Pending => Err(WalletError::Internal("approval still pending".into())),
    }
}
