// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction envelope building.
//!
//! ## Envelope Layout
//!
//! Bencodex dictionary with single-byte binary keys:
//!
//! | Key | Field |
//! |-----|-------|
//! | `a` | actions (list) |
//! | `g` | genesis hash |
//! | `l` | gas limit |
//! | `m` | max gas price `[currency, raw value]` |
//! | `n` | nonce |
//! | `p` | public key (uncompressed) |
//! | `s` | signer address (20 bytes) |
//! | `t` | timestamp (text, microsecond UTC) |
//! | `u` | updated addresses (list) |
//! | `S` | signature, present only once signed |

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::bencodex::{Key, Value};

const ACTIONS_KEY: u8 = b'a';
const GENESIS_HASH_KEY: u8 = b'g';
const GAS_LIMIT_KEY: u8 = b'l';
const MAX_GAS_PRICE_KEY: u8 = b'm';
const NONCE_KEY: u8 = b'n';
const PUBLIC_KEY_KEY: u8 = b'p';
const SIGNER_KEY: u8 = b's';
const TIMESTAMP_KEY: u8 = b't';
const UPDATED_ADDRESSES_KEY: u8 = b'u';
const SIGNATURE_KEY: u8 = b'S';

/// Gas limit for asset transfers; every other action gets 1.
pub const TRANSFER_GAS_LIMIT: i128 = 4;
pub const DEFAULT_GAS_LIMIT: i128 = 1;

/// Fee currency of the gas price ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Currency {
    pub ticker: String,
    pub decimal_places: u8,
}

impl Currency {
    pub fn mead() -> Self {
        Self {
            ticker: "Mead".to_string(),
            decimal_places: 18,
        }
    }

    fn to_value(&self) -> Value {
        let mut entries = BTreeMap::new();
        entries.insert(
            Key::from("decimalPlaces"),
            Value::Binary(vec![self.decimal_places]),
        );
        entries.insert(Key::from("minters"), Value::Null);
        entries.insert(Key::from("ticker"), Value::Text(self.ticker.clone()));
        Value::Dictionary(entries)
    }
}

/// Default fee ceiling: one whole Mead.
pub fn default_max_gas_price() -> (Currency, i128) {
    (Currency::mead(), 10i128.pow(18))
}

/// Gas limit for an action, keyed on its `type_id`.
pub fn gas_limit_for(action: &Value) -> i128 {
    match action.get(&Key::from("type_id")).and_then(Value::as_text) {
        Some(type_id) if type_id.starts_with("transfer_asset") => TRANSFER_GAS_LIMIT,
        _ => DEFAULT_GAS_LIMIT,
    }
}

/// Unsigned transaction fields.
#[derive(Debug, Clone)]
pub struct UnsignedTx {
    pub signer: [u8; 20],
    pub actions: Vec<Value>,
    pub nonce: u64,
    pub genesis_hash: Vec<u8>,
    pub public_key: Vec<u8>,
    pub timestamp: DateTime<Utc>,
    pub max_gas_price: (Currency, i128),
    pub gas_limit: i128,
}

impl UnsignedTx {
    pub fn to_value(&self) -> Value {
        let mut entries = BTreeMap::new();
        let key = |b: u8| Key::Binary(vec![b]);

        entries.insert(key(ACTIONS_KEY), Value::List(self.actions.clone()));
        entries.insert(key(GENESIS_HASH_KEY), Value::Binary(self.genesis_hash.clone()));
        entries.insert(key(GAS_LIMIT_KEY), Value::Integer(self.gas_limit));
        let (currency, raw) = &self.max_gas_price;
        entries.insert(
            key(MAX_GAS_PRICE_KEY),
            Value::List(vec![currency.to_value(), Value::Integer(*raw)]),
        );
        entries.insert(key(NONCE_KEY), Value::Integer(i128::from(self.nonce)));
        entries.insert(key(PUBLIC_KEY_KEY), Value::Binary(self.public_key.clone()));
        entries.insert(key(SIGNER_KEY), Value::Binary(self.signer.to_vec()));
        entries.insert(
            key(TIMESTAMP_KEY),
            Value::Text(format_timestamp(&self.timestamp)),
        );
        entries.insert(key(UPDATED_ADDRESSES_KEY), Value::List(Vec::new()));
        Value::Dictionary(entries)
    }
}

fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Add the signature entry to an unsigned envelope.
///
/// Returns `None` when `unsigned` is not a dictionary.
pub fn attach_signature(unsigned: Value, signature: Vec<u8>) -> Option<Value> {
    match unsigned {
        Value::Dictionary(mut entries) => {
            entries.insert(Key::Binary(vec![SIGNATURE_KEY]), Value::Binary(signature));
            Some(Value::Dictionary(entries))
        }
        _ => None,
    }
}

/// Parse a `0x` address into its 20 raw bytes.
pub fn address_bytes(address: &str) -> Option<[u8; 20]> {
    let bytes = alloy::hex::decode(address).ok()?;
    bytes.try_into().ok()
}
