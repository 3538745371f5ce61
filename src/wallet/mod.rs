// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet services behind the dispatcher.
//!
//! - `accounts` - account list and key material
//! - `sites` - connected origins
//! - `network` - network list and selection
//! - `history` - staged transactions per signer
//! - `signing` - approval-gated signing and transfers

pub mod accounts;
pub mod history;
pub mod network;
pub mod signing;
pub mod sites;

pub use accounts::AccountRegistry;
pub use history::TxHistory;
pub use network::NetworkController;
pub use signing::SigningPipeline;
pub use sites::SiteRegistry;
