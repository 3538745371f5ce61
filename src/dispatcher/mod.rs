// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Dispatcher
//!
//! Serves ports. Each port gets its own task that:
//!
//! 1. Resolves every request against the caller's capability set
//! 2. Runs the call on its own task, so slow calls (approvals, RPC) do not
//!    hold up the port and a panic only costs that one call
//! 3. Replies `{messageId, result}` or `{messageId, error}` exactly once
//! 4. Forwards every wallet event to the port
//!
//! Page ports carry the relay's origin on each request. An origin that is
//! not connected may only call `connect` and `isConnected`.

pub mod methods;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, mpsc};

use crate::blockchain::Network;
use crate::error::{WalletError, WalletResult, WireError};
use crate::protocol::{PortConnector, PortHandle, PortKind, PortMessage, PortRequest};
use crate::state::AppState;

use methods::{
    amount_string, loose_params, params, Capability, ConfirmationMethod, GraphqlMethod,
    NetworkMethod, PageNetworkMethod, PageWalletMethod, PassphraseMethod, StorageMethod,
    WalletMethod,
};

const PORT_REQUEST_BUFFER: usize = 32;
const PORT_MESSAGE_BUFFER: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxRef {
    tx_id: String,
    endpoint: String,
}

fn to_json<T: serde::Serialize>(value: T) -> WalletResult<Value> {
    Ok(serde_json::to_value(value)?)
}

pub struct Dispatcher {
    state: AppState,
}

impl Dispatcher {
    pub fn new(state: AppState) -> Arc<Self> {
        Arc::new(Self { state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Open a port for a caller of `kind` and start serving it.
    ///
    /// The port lives until the caller drops its request sender or its
    /// message receiver.
    pub fn open_port(self: &Arc<Self>, kind: PortKind) -> PortHandle {
        let (req_tx, mut req_rx) = mpsc::channel::<PortRequest>(PORT_REQUEST_BUFFER);
        let (msg_tx, msg_rx) = mpsc::channel::<PortMessage>(PORT_MESSAGE_BUFFER);
        let mut events = self.state.events.subscribe();
        let dispatcher = Arc::clone(self);

        tokio::spawn(async move {
            tracing::debug!(?kind, "Port opened");
            loop {
                tokio::select! {
                    _ = msg_tx.closed() => break,

                    request = req_rx.recv() => {
                        let Some(request) = request else { break };
                        let dispatcher = Arc::clone(&dispatcher);
                        let msg_tx = msg_tx.clone();
                        tokio::spawn(async move {
                            let message_id = request.message_id;
                            let outcome = dispatcher.dispatch(kind, request).await;
                            if msg_tx.send(PortMessage::reply(message_id, outcome)).await.is_err() {
                                tracing::debug!(message_id, "Port closed before reply");
                            }
                        });
                    }

                    event = events.recv() => match event {
                        Ok(event) => {
                            if msg_tx.send(PortMessage::Event(event)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Port fell behind on events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            tracing::debug!(?kind, "Port closed");
        });

        PortHandle {
            requests: req_tx,
            messages: msg_rx,
        }
    }

    /// Run one request to completion. Always yields exactly one outcome.
    pub async fn dispatch(
        self: &Arc<Self>,
        kind: PortKind,
        request: PortRequest,
    ) -> Result<Value, WireError> {
        let message_id = request.message_id;
        let call = format!("{}.{}", request.action, request.method);
        let dispatcher = Arc::clone(self);

        let outcome = match tokio::spawn(async move { dispatcher.handle(kind, request).await }).await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(message_id, call = %call, error = %e, "Handler aborted");
                Err(WalletError::Internal(format!("{call} failed unexpectedly")))
            }
        };

        outcome.map_err(|e| {
            tracing::debug!(message_id, call = %call, error = %e, "Call failed");
            WireError::from(&e)
        })
    }

    async fn handle(&self, kind: PortKind, request: PortRequest) -> WalletResult<Value> {
        let capability = Capability::resolve(kind, &request.action, &request.method)?;
        if capability.requires_session() {
            self.state.session.require_signed_in()?;
        }

        let p = request.params;
        match capability {
            Capability::PageWallet(method) => {
                let origin = request
                    .origin
                    .ok_or_else(|| WalletError::InvalidParams("missing origin".into()))?;
                self.page_wallet(method, &origin, p).await
            }
            Capability::PageNetwork(method) => self.page_network(method, p),
            Capability::Wallet(method) => self.wallet(method, p).await,
            Capability::Network(method) => self.network(method, p),
            Capability::Confirmation(method) => self.confirmation(method, p),
            Capability::Graphql(method) => self.graphql(method, p).await,
            Capability::Storage(method) => self.storage(method, p),
            Capability::Passphrase(method) => self.passphrase(method, p),
            Capability::HasWallet => to_json(self.state.accounts.has_wallet()?),
        }
    }

    // =========================================================================
    // Page callers
    // =========================================================================

    async fn page_wallet(
        &self,
        method: PageWalletMethod,
        origin: &str,
        p: Value,
    ) -> WalletResult<Value> {
        let state = &self.state;
        let gated = !matches!(
            method,
            PageWalletMethod::Connect | PageWalletMethod::IsConnected
        );
        if gated && !state.sites.is_connected(origin)? {
            tracing::warn!(origin, ?method, "Call from unconnected origin");
            return Err(WalletError::NotConnected(origin.to_string()));
        }

        match method {
            PageWalletMethod::Sign => {
                let (signer, action): (String, String) = params(p)?;
                to_json(state.signing.sign(&signer, &action).await?)
            }
            PageWalletMethod::SignTx => {
                let (signer, unsigned): (String, String) = params(p)?;
                to_json(state.signing.sign_tx(&signer, &unsigned).await?)
            }
            PageWalletMethod::ListAccounts => {
                let allowed = state.sites.authorized_addresses(origin)?;
                to_json(state.accounts.list_accounts(Some(&allowed))?)
            }
            PageWalletMethod::GetPublicKey => {
                let (address,): (String,) = params(p)?;
                to_json(state.accounts.public_key(&address)?)
            }
            PageWalletMethod::Connect => to_json(state.sites.connect(origin).await?),
            PageWalletMethod::IsConnected => to_json(state.sites.is_connected(origin)?),
        }
    }

    fn page_network(&self, method: PageNetworkMethod, p: Value) -> WalletResult<Value> {
        match method {
            PageNetworkMethod::GetCurrentNetwork => {
                to_json(self.state.networks.get_current_network()?)
            }
            PageNetworkMethod::SwitchNetwork => {
                let (id,): (String,) = params(p)?;
                to_json(self.state.networks.switch_network(&id)?)
            }
        }
    }

    // =========================================================================
    // Privileged callers
    // =========================================================================

    async fn wallet(&self, method: WalletMethod, p: Value) -> WalletResult<Value> {
        let state = &self.state;
        match method {
            WalletMethod::CreatePrimaryWallet => {
                let (name, mnemonic): (String, String) = params(p)?;
                to_json(state.accounts.create_primary(&name, &mnemonic)?)
            }
            WalletMethod::CreateSequentialWallet => {
                let (primary, index): (String, u32) = params(p)?;
                to_json(state.accounts.create_sequential(&primary, index)?)
            }
            WalletMethod::CreatePrivateKeyWallet => {
                let (name, key): (String, String) = params(p)?;
                to_json(state.accounts.import_private_key(&name, &key)?)
            }
            WalletMethod::RenameAccount => {
                let (address, name): (String, String) = params(p)?;
                to_json(state.accounts.rename_account(&address, &name)?)
            }
            WalletMethod::DeleteAccount => {
                let (address,): (String,) = params(p)?;
                state.accounts.delete_account(&address)?;
                Ok(Value::Null)
            }
            WalletMethod::GetCurrentAccount => to_json(state.accounts.current_account()?),
            WalletMethod::SelectAccount => {
                let (address,): (String,) = params(p)?;
                to_json(state.accounts.select_account(&address)?)
            }
            WalletMethod::SendAsset => {
                let (sender, receiver, amount, nonce): (String, String, Value, u64) = params(p)?;
                let amount = amount_string(&amount)?;
                to_json(
                    state
                        .signing
                        .send_asset(&sender, &receiver, &amount, nonce)
                        .await?,
                )
            }
            WalletMethod::NextNonce => {
                let (address,): (String,) = params(p)?;
                to_json(state.signing.next_nonce(&address).await?)
            }
            WalletMethod::GetPrivateKey => {
                let (address, passphrase): (String, String) = params(p)?;
                to_json(state.accounts.private_key(&address, &passphrase)?)
            }
            WalletMethod::Sign => {
                let (signer, action): (String, String) = params(p)?;
                to_json(state.signing.sign(&signer, &action).await?)
            }
            WalletMethod::SignTx => {
                let (signer, unsigned): (String, String) = params(p)?;
                to_json(state.signing.sign_tx(&signer, &unsigned).await?)
            }
            WalletMethod::GetApprovalRequests => to_json(state.approvals.get_all()?),
            WalletMethod::ApproveRequest => self.approve(p),
            WalletMethod::RejectRequest => self.reject(p),
            WalletMethod::ListAccounts => to_json(state.accounts.list_accounts(None)?),
            WalletMethod::GetPublicKey => {
                let (address,): (String,) = params(p)?;
                to_json(state.accounts.public_key(&address)?)
            }
            WalletMethod::ListTransactions => {
                let (address,): (String,) = params(p)?;
                to_json(state.history.list(&address)?)
            }
            WalletMethod::RefreshTransactionStatus => {
                let (signer, tx_id): (String, String) = params(p)?;
                to_json(state.signing.refresh_status(&signer, &tx_id).await?)
            }
            WalletMethod::Disconnect => {
                let (origin,): (String,) = params(p)?;
                to_json(state.sites.disconnect(&origin)?)
            }
        }
    }

    fn approve(&self, p: Value) -> WalletResult<Value> {
        let mut args = loose_params(p)?.into_iter();
        let id = match args.next() {
            Some(Value::String(id)) => id,
            _ => return Err(WalletError::InvalidParams("missing request id".into())),
        };
        let metadata = args.next().unwrap_or(Value::Null);
        self.state.approvals.approve(&id, metadata)?;
        Ok(Value::Null)
    }

    fn reject(&self, p: Value) -> WalletResult<Value> {
        let (id,): (String,) = params(p)?;
        self.state.approvals.reject(&id)?;
        Ok(Value::Null)
    }

    fn network(&self, method: NetworkMethod, p: Value) -> WalletResult<Value> {
        let networks = &self.state.networks;
        match method {
            NetworkMethod::GetCurrentNetwork => to_json(networks.get_current_network()?),
            NetworkMethod::SwitchNetwork => {
                let (id,): (String,) = params(p)?;
                to_json(networks.switch_network(&id)?)
            }
            NetworkMethod::ListNetworks => to_json(networks.list_networks()?),
            NetworkMethod::ImportNetwork => {
                let (network,): (Network,) = params(p)?;
                to_json(networks.import_network(network)?)
            }
            NetworkMethod::UpdateNetwork => {
                let (network,): (Network,) = params(p)?;
                to_json(networks.update_network(network)?)
            }
            NetworkMethod::DeleteNetwork => {
                let (id,): (String,) = params(p)?;
                networks.delete_network(&id)?;
                Ok(Value::Null)
            }
        }
    }

    fn confirmation(&self, method: ConfirmationMethod, p: Value) -> WalletResult<Value> {
        match method {
            ConfirmationMethod::GetAll => to_json(self.state.approvals.get_all()?),
            ConfirmationMethod::Approve => self.approve(p),
            ConfirmationMethod::Reject => self.reject(p),
            ConfirmationMethod::HasApprovalRequest => {
                to_json(self.state.approvals.has_pending()?)
            }
        }
    }

    async fn graphql(&self, method: GraphqlMethod, p: Value) -> WalletResult<Value> {
        let client = self.state.signing.client().await?;
        match method {
            GraphqlMethod::GetLastBlockIndex => to_json(client.last_block_index().await?),
            GraphqlMethod::GetBalance => {
                let (address,): (String,) = params(p)?;
                to_json(client.balance(&address).await?)
            }
            GraphqlMethod::GetNextTxNonce => {
                let (address,): (String,) = params(p)?;
                to_json(client.next_tx_nonce(&address).await?)
            }
            GraphqlMethod::GetTransferAsset => {
                let (sender, receiver, amount): (String, String, Value) = params(p)?;
                to_json(
                    client
                        .transfer_asset(&sender, &receiver, &amount_string(&amount)?)
                        .await?,
                )
            }
            GraphqlMethod::GetTransactionStatus => {
                let (tx,): (TxRef,) = params(p)?;
                to_json(client.transaction_status(&tx.tx_id, &tx.endpoint).await?)
            }
        }
    }

    fn storage(&self, method: StorageMethod, p: Value) -> WalletResult<Value> {
        let store = &self.state.store;
        match method {
            StorageMethod::Set => {
                let (key, value): (String, Value) = params(p)?;
                store.set(&key, &value)?;
                Ok(Value::Null)
            }
            StorageMethod::Get => {
                let (key,): (String,) = params(p)?;
                Ok(store.get::<Value>(&key)?.unwrap_or(Value::Null))
            }
            StorageMethod::Remove => {
                let (key,): (String,) = params(p)?;
                store.remove(&key)?;
                Ok(Value::Null)
            }
            StorageMethod::Has => {
                let (key,): (String,) = params(p)?;
                to_json(store.has(&key)?)
            }
            StorageMethod::SecureSet => {
                let (key, value): (String, Value) = params(p)?;
                store.secure_set(&key, &value)?;
                Ok(Value::Null)
            }
            StorageMethod::ClearAll => {
                store.clear_all()?;
                tracing::warn!("Storage cleared");
                Ok(Value::Null)
            }
        }
    }

    fn passphrase(&self, method: PassphraseMethod, p: Value) -> WalletResult<Value> {
        let session = &self.state.session;
        match method {
            PassphraseMethod::Initialize => {
                let (passphrase,): (String,) = params(p)?;
                session.initialize(&passphrase)?;
                Ok(Value::Null)
            }
            PassphraseMethod::Set => {
                let (passphrase,): (String,) = params(p)?;
                session.set_passphrase(&passphrase);
                Ok(Value::Null)
            }
            PassphraseMethod::CheckTtl => {
                let remaining = session.remaining().map(|d| d.as_secs());
                Ok(json!({ "signedIn": remaining.is_some(), "remainingSecs": remaining }))
            }
            PassphraseMethod::Remove => {
                session.logout();
                Ok(Value::Null)
            }
            PassphraseMethod::IsSignedIn => to_json(session.is_signed_in()?),
            PassphraseMethod::IsValid => {
                let (candidate,): (String,) = params(p)?;
                to_json(session.is_valid(&candidate)?)
            }
        }
    }
}

/// Opens in-process ports of one kind.
pub struct DispatcherConnector {
    dispatcher: Arc<Dispatcher>,
    kind: PortKind,
}

impl DispatcherConnector {
    pub fn new(dispatcher: Arc<Dispatcher>, kind: PortKind) -> Self {
        Self { dispatcher, kind }
    }
}

#[async_trait]
impl PortConnector for DispatcherConnector {
    async fn connect(&self) -> WalletResult<PortHandle> {
        Ok(self.dispatcher.open_port(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::TracingPresenter;
    use crate::config::EngineConfig;
    use crate::protocol::events::{CONNECTED, NETWORK_CHANGED};
    use crate::protocol::{PageClient, Relay};
    use crate::storage::MemoryBackend;
    use crate::test_support::{chain_stub, transfer_action_hex};
    use tokio_util::sync::CancellationToken;

    const PHRASE: &str = "test test test test test test test test test test test junk";
    const FIRST: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
    const ORIGIN: &str = "https://dapp.example";

    fn dispatcher() -> Arc<Dispatcher> {
        let state = AppState::new(
            &EngineConfig::default(),
            Arc::new(MemoryBackend::new()),
            chain_stub(11),
            Arc::new(TracingPresenter),
        )
        .unwrap();
        Dispatcher::new(state)
    }

    fn request(action: &str, method: &str, params: Value) -> PortRequest {
        PortRequest {
            action: action.into(),
            method: method.into(),
            params,
            message_id: 1,
            origin: None,
        }
    }

    async fn privileged(
        dispatcher: &Arc<Dispatcher>,
        action: &str,
        method: &str,
        params: Value,
    ) -> Result<Value, WireError> {
        dispatcher
            .dispatch(PortKind::Privileged, request(action, method, params))
            .await
    }

    async fn unlocked_with_wallet() -> Arc<Dispatcher> {
        let dispatcher = dispatcher();
        privileged(&dispatcher, "passphrase", "initialize", json!(["pw"]))
            .await
            .unwrap();
        privileged(
            &dispatcher,
            "wallet",
            "createPrimaryWallet",
            json!(["Main", PHRASE]),
        )
        .await
        .unwrap();
        dispatcher
    }

    /// Page client wired through a relay to `dispatcher`.
    fn page(dispatcher: &Arc<Dispatcher>, shutdown: &CancellationToken) -> PageClient {
        let (page_tx, page_rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let relay = Relay::new(
            ORIGIN,
            DispatcherConnector::new(dispatcher.clone(), PortKind::Page),
        );
        tokio::spawn(relay.run(page_rx, relay_tx, shutdown.clone()));
        PageClient::spawn(page_tx, relay_rx, shutdown.clone())
    }

    async fn approve_next(dispatcher: &Arc<Dispatcher>, metadata: Value) {
        loop {
            let pending = privileged(dispatcher, "confirmation", "getAll", json!([]))
                .await
                .unwrap();
            if let Some(id) = pending[0]["id"].as_str() {
                privileged(dispatcher, "confirmation", "approve", json!([id, metadata]))
                    .await
                    .unwrap();
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn session_gates_privileged_calls() {
        let dispatcher = dispatcher();
        let err = privileged(&dispatcher, "wallet", "listAccounts", json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.code, "not_signed_in");

        assert_eq!(
            privileged(&dispatcher, "hasWallet", "", json!([]))
                .await
                .unwrap(),
            json!(false)
        );
        assert_eq!(
            privileged(&dispatcher, "passphrase", "isSignedIn", json!([]))
                .await
                .unwrap(),
            json!(false)
        );
    }

    #[tokio::test]
    async fn unknown_methods_and_bad_params() {
        let dispatcher = unlocked_with_wallet().await;
        let err = privileged(&dispatcher, "wallet", "selfDestruct", json!([]))
            .await
            .unwrap_err();
        assert_eq!(err.code, "unknown_method");

        let err = privileged(&dispatcher, "wallet", "getPublicKey", json!([42]))
            .await
            .unwrap_err();
        assert_eq!(err.code, "invalid_params");
    }

    #[tokio::test]
    async fn deeply_nested_sign_input_is_invalid_action() {
        let dispatcher = unlocked_with_wallet().await;
        let err = privileged(
            &dispatcher,
            "wallet",
            "sign",
            json!([FIRST, "6c".repeat(500_000)]),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, "invalid_action");
    }

    #[tokio::test]
    async fn storage_surface_hides_secure_records() {
        let dispatcher = unlocked_with_wallet().await;
        privileged(&dispatcher, "storage", "secureSet", json!(["token", "s3cret"]))
            .await
            .unwrap();
        assert_eq!(
            privileged(&dispatcher, "storage", "has", json!(["token"]))
                .await
                .unwrap(),
            json!(true)
        );
        let err = privileged(&dispatcher, "storage", "get", json!(["token"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, "access_violation");
    }

    #[tokio::test]
    async fn page_flow_connect_then_sign() {
        let dispatcher = unlocked_with_wallet().await;
        let shutdown = CancellationToken::new();
        let page = page(&dispatcher, &shutdown);

        // not connected yet
        let err = page.call("listAccounts", json!([])).await.unwrap_err();
        assert_eq!(err.code, "not_connected");
        assert_eq!(page.call("isConnected", json!([])).await.unwrap(), json!(false));

        let mut connected = page.subscribe(CONNECTED);
        let connect = tokio::spawn({
            let page = page.clone();
            async move { page.call("connect", json!([])).await }
        });
        approve_next(&dispatcher, json!([FIRST])).await;
        assert_eq!(connect.await.unwrap().unwrap(), json!([FIRST]));
        assert_eq!(connected.recv().await.unwrap()["origin"], ORIGIN);

        let accounts = page.call("listAccounts", json!([])).await.unwrap();
        assert_eq!(accounts[0]["address"], FIRST);

        let sign = tokio::spawn({
            let page = page.clone();
            async move { page.call("sign", json!([FIRST, transfer_action_hex()])).await }
        });
        approve_next(&dispatcher, Value::Null).await;
        let signed = sign.await.unwrap().unwrap();
        let bytes = alloy::hex::decode(signed.as_str().unwrap()).unwrap();
        let envelope = crate::blockchain::bencodex::decode(&bytes).unwrap();
        assert!(envelope.as_dictionary().is_some());

        shutdown.cancel();
    }

    #[tokio::test]
    async fn page_cannot_reach_privileged_methods() {
        let dispatcher = unlocked_with_wallet().await;
        let shutdown = CancellationToken::new();
        let page = page(&dispatcher, &shutdown);

        let connect = tokio::spawn({
            let page = page.clone();
            async move { page.call("connect", json!([])).await }
        });
        approve_next(&dispatcher, json!([FIRST])).await;
        connect.await.unwrap().unwrap();

        let err = page
            .call("getPrivateKey", json!([FIRST, "pw"]))
            .await
            .unwrap_err();
        assert_eq!(err.code, "unknown_method");
        shutdown.cancel();
    }

    #[tokio::test]
    async fn network_switch_reaches_every_port() {
        let dispatcher = unlocked_with_wallet().await;
        let shutdown = CancellationToken::new();
        let page = page(&dispatcher, &shutdown);
        let mut changes = page.subscribe(NETWORK_CHANGED);
        let mut ui = dispatcher.open_port(PortKind::Privileged);

        // make sure the relay's port is up before emitting
        page.call("getCurrentNetwork", json!([])).await.unwrap();
        let switched = page
            .call("switchNetwork", json!([crate::blockchain::HEIMDALL_NETWORK_ID]))
            .await
            .unwrap();
        assert_eq!(switched["id"], crate::blockchain::HEIMDALL_NETWORK_ID);

        assert_eq!(
            changes.recv().await.unwrap()["id"],
            crate::blockchain::HEIMDALL_NETWORK_ID
        );
        match ui.messages.recv().await.unwrap() {
            PortMessage::Event(event) => assert_eq!(event.event, NETWORK_CHANGED),
            other => panic!("expected event, got {other:?}"),
        }
        shutdown.cancel();
    }

    #[tokio::test]
    async fn send_asset_through_privileged_port() {
        let dispatcher = unlocked_with_wallet().await;
        let mut port = dispatcher.open_port(PortKind::Privileged);

        port.requests
            .send(PortRequest {
                message_id: 7,
                ..request("wallet", "sendNCG", json!([FIRST, FIRST, "1", 10]))
            })
            .await
            .unwrap();
        match port.messages.recv().await.unwrap() {
            PortMessage::Failure { message_id, error } => {
                assert_eq!(message_id, 7);
                assert_eq!(error.code, "invalid_nonce");
            }
            other => panic!("expected failure, got {other:?}"),
        }

        let nonce = privileged(&dispatcher, "wallet", "nextNonce", json!([FIRST]))
            .await
            .unwrap();
        assert_eq!(nonce, json!(11));
        let tx = privileged(
            &dispatcher,
            "wallet",
            "sendNCG",
            json!([FIRST, FIRST, 1.5, 11]),
        )
        .await
        .unwrap();
        assert_eq!(tx["status"], "STAGING");
        assert_eq!(tx["type"], "transfer_asset5");

        let history = privileged(&dispatcher, "wallet", "listTransactions", json!([FIRST]))
            .await
            .unwrap();
        assert_eq!(history.as_array().unwrap().len(), 1);
    }
}
