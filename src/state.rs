// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::approval::{ApprovalPresenter, ApprovalQueue};
use crate::config::EngineConfig;
use crate::error::WalletResult;
use crate::protocol::EventBus;
use crate::rpc::{GraphqlTransport, RpcPool};
use crate::session::SessionManager;
use crate::storage::{SecureStore, StorageBackend};
use crate::wallet::{AccountRegistry, NetworkController, SigningPipeline, SiteRegistry, TxHistory};

/// Every long-lived component, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<SessionManager>,
    pub store: SecureStore,
    pub events: EventBus,
    pub approvals: Arc<ApprovalQueue>,
    pub networks: Arc<NetworkController>,
    pub accounts: Arc<AccountRegistry>,
    pub sites: Arc<SiteRegistry>,
    pub history: Arc<TxHistory>,
    pub signing: Arc<SigningPipeline>,
}

impl AppState {
    pub fn new(
        config: &EngineConfig,
        backend: Arc<dyn StorageBackend>,
        transport: Arc<dyn GraphqlTransport>,
        presenter: Arc<dyn ApprovalPresenter>,
    ) -> WalletResult<Self> {
        let session = Arc::new(SessionManager::new(
            Arc::clone(&backend),
            config.session_ttl,
        ));
        let store = SecureStore::new(backend, session.clone());
        let events = EventBus::new();

        let approvals = Arc::new(ApprovalQueue::new(store.clone(), presenter));
        let networks = Arc::new(NetworkController::new(store.clone(), events.clone()));
        networks.ensure_defaults()?;
        let accounts = Arc::new(AccountRegistry::new(store.clone(), session.clone()));
        let sites = Arc::new(SiteRegistry::new(
            store.clone(),
            approvals.clone(),
            events.clone(),
        ));
        let history = Arc::new(TxHistory::new(store.clone()));
        let rpc = Arc::new(RpcPool::new(transport, config.freshness_window));
        let signing = Arc::new(SigningPipeline::new(
            session.clone(),
            accounts.clone(),
            networks.clone(),
            approvals.clone(),
            rpc,
            history.clone(),
        ));

        Ok(Self {
            session,
            store,
            events,
            approvals,
            networks,
            accounts,
            sites,
            history,
            signing,
        })
    }
}
