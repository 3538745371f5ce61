// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chrono Wallet - Browser Wallet Trust-Boundary Engine
//!
//! Holds encrypted account keys, gates every signature behind an explicit
//! user approval and exposes a narrow, closed capability surface to web
//! pages through a stateless relay.
//!
//! ## Modules
//!
//! - `storage` - Two-tier record store over a KV backend (memory, redb)
//! - `session` - Passphrase lifecycle with TTL
//! - `approval` - Durable, restart-safe approval queue
//! - `rpc` - GraphQL client with endpoint health filtering and failover
//! - `blockchain` - Bencodex codec, account keys, transaction envelopes
//! - `wallet` - Accounts, connected sites, networks, signing pipeline
//! - `protocol` - Page client, relay, wire envelopes, native framing
//! - `dispatcher` - Capability resolution and port serving

pub mod approval;
pub mod blockchain;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod protocol;
pub mod rpc;
pub mod session;
pub mod state;
pub mod storage;
pub mod wallet;

#[cfg(test)]
mod test_support;
