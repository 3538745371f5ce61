// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-facing building blocks.
//!
//! This module provides:
//! - The Bencodex codec used for actions and transactions
//! - Account keys behind the `AccountSigner` trait
//! - Unsigned transaction envelopes and signature attachment
//! - Network definitions

pub mod account;
pub mod bencodex;
pub mod transactions;
pub mod types;

pub use account::{AccountSigner, LocalAccount, SignerError};
pub use types::*;
