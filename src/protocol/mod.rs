// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message routing between page, relay and dispatcher.

pub mod events;
pub mod native;
pub mod page;
pub mod relay;
pub mod wire;

pub use events::{EventBus, WalletEvent};
pub use page::PageClient;
pub use relay::{PortConnector, Relay};
pub use wire::{MessageSource, PortHandle, PortKind, PortMessage, PortRequest, WireMessage};
