// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Native messaging host.
//!
//! Speaks the privileged channel over stdio: framed `PortRequest`s on stdin,
//! framed replies, wallet events and approval prompts on stdout. Logs go to
//! stderr.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{stdin, stdout};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use chrono_wallet_core::approval::{ApprovalRequest, ChannelPresenter};
use chrono_wallet_core::config::{EngineConfig, LogFormat};
use chrono_wallet_core::dispatcher::Dispatcher;
use chrono_wallet_core::error::WalletError;
use chrono_wallet_core::protocol::events::APPROVAL_REQUESTED;
use chrono_wallet_core::protocol::native::{self, FrameError};
use chrono_wallet_core::protocol::{PortKind, PortMessage, PortRequest, WalletEvent};
use chrono_wallet_core::rpc::HttpTransport;
use chrono_wallet_core::state::AppState;
use chrono_wallet_core::storage::{RedbBackend, StorageError};

#[derive(Debug, thiserror::Error)]
enum HostError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = EngineConfig::from_env();
    init_tracing(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Host failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: EngineConfig) -> Result<(), HostError> {
    let database = config.database_path();
    tracing::info!(path = %database.display(), "Opening wallet database");
    let backend = Arc::new(RedbBackend::open(&database)?);

    let (approval_tx, approval_rx) = mpsc::unbounded_channel();
    let state = AppState::new(
        &config,
        backend,
        Arc::new(HttpTransport::new()),
        Arc::new(ChannelPresenter::new(approval_tx)),
    )?;
    let pending = state.approvals.get_all()?.len();
    if pending > 0 {
        tracing::info!(pending, "Approval requests carried over from last run");
    }

    let dispatcher = Dispatcher::new(state);
    let port = dispatcher.open_port(PortKind::Privileged);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, shutting down");
            }
            shutdown.cancel();
        }
    });

    let writer = tokio::spawn(write_loop(port.messages, approval_rx, shutdown.clone()));
    read_loop(port.requests, shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "Writer task ended abnormally");
    }
    tracing::info!("Host stopped");
    Ok(())
}

/// Forward framed requests from stdin until EOF or shutdown.
async fn read_loop(requests: mpsc::Sender<PortRequest>, shutdown: CancellationToken) {
    let mut input = stdin();
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = native::read_message::<PortRequest, _>(&mut input) => message,
        };
        match message {
            Ok(Some(request)) => {
                if requests.send(request).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::info!("Input closed");
                break;
            }
            Err(FrameError::Json(e)) => {
                tracing::warn!(error = %e, "Dropping malformed request");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read request");
                break;
            }
        }
    }
}

async fn write_loop(
    mut messages: mpsc::Receiver<PortMessage>,
    mut approvals: mpsc::UnboundedReceiver<ApprovalRequest>,
    shutdown: CancellationToken,
) {
    let mut output = stdout();
    loop {
        let message = tokio::select! {
            _ = shutdown.cancelled() => break,
            message = messages.recv() => match message {
                Some(message) => message,
                None => break,
            },
            request = approvals.recv() => match request.map(approval_event) {
                Some(Ok(event)) => event,
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Could not encode approval request");
                    continue;
                }
                None => break,
            },
        };
        if let Err(e) = native::write_message(&mut output, &message).await {
            tracing::error!(error = %e, "Failed to write message");
            break;
        }
    }
}

fn approval_event(request: ApprovalRequest) -> Result<PortMessage, HostError> {
    Ok(PortMessage::Event(WalletEvent {
        event: APPROVAL_REQUESTED.to_string(),
        data: serde_json::to_value(request)?,
    }))
}
