// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain RPC over GraphQL.
//!
//! - `transport` - one request against one endpoint (reqwest in production)
//! - `client` - health filtering, failover and the wallet's queries
//! - `pool` - client cache keyed by the current network

pub mod client;
pub mod pool;
pub mod transport;

pub use client::{select_fresh, EndpointFailure, RpcClient, StagedTx};
pub use pool::RpcPool;
pub use transport::{GraphqlTransport, HttpTransport, RpcError};
