// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Bencodex codec for actions and transactions.
//!
//! ## Grammar
//!
//! ```text
//! null      n
//! boolean   t | f
//! integer   i <decimal> e
//! binary    <len> : <bytes>
//! text      u <len> : <utf-8 bytes>
//! list      l <value>* e
//! dict      d (<key> <value>)* e      keys: binary or text
//! ```
//!
//! Dictionary keys are kept sorted: binary keys before text keys, each
//! group ordered by raw bytes. Encoding is therefore canonical, and the
//! decoder only accepts canonical input: keys strictly increasing, no `+`
//! sign, no `-0` and no leading zeros in integers or lengths. Nesting is
//! capped at [`MAX_DEPTH`].

use std::collections::BTreeMap;

use alloy::hex;
use serde_json::{Map, Value as Json};

/// Deepest list/dictionary nesting the decoder accepts.
pub const MAX_DEPTH: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),

    #[error("unexpected byte 0x{byte:02x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },

    #[error("invalid integer at offset {0}")]
    InvalidInteger(usize),

    #[error("invalid utf-8 text at offset {0}")]
    InvalidText(usize),

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    #[error("nesting deeper than {MAX_DEPTH} at offset {0}")]
    TooDeep(usize),

    #[error("dictionary key out of order or repeated at offset {0}")]
    UnorderedKey(usize),
}

/// Dictionary key. Binary keys sort before text keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Binary(Vec<u8>),
    Text(String),
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Key::Binary(b.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i128),
    Binary(Vec<u8>),
    Text(String),
    List(Vec<Value>),
    Dictionary(BTreeMap<Key, Value>),
}

impl Value {
    pub fn as_dictionary(&self) -> Option<&BTreeMap<Key, Value>> {
        match self {
            Value::Dictionary(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a dictionary entry.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.as_dictionary().and_then(|d| d.get(key))
    }
}

// =============================================================================
// Encoding
// =============================================================================

pub fn encode(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    encode_into(value, &mut out);
    out
}

fn encode_into(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Null => out.push(b'n'),
        Value::Boolean(true) => out.push(b't'),
        Value::Boolean(false) => out.push(b'f'),
        Value::Integer(i) => {
            out.push(b'i');
            out.extend_from_slice(i.to_string().as_bytes());
            out.push(b'e');
        }
        Value::Binary(bytes) => encode_binary(bytes, out),
        Value::Text(text) => encode_text(text, out),
        Value::List(items) => {
            out.push(b'l');
            for item in items {
                encode_into(item, out);
            }
            out.push(b'e');
        }
        Value::Dictionary(entries) => {
            out.push(b'd');
            for (key, item) in entries {
                match key {
                    Key::Binary(bytes) => encode_binary(bytes, out),
                    Key::Text(text) => encode_text(text, out),
                }
                encode_into(item, out);
            }
            out.push(b'e');
        }
    }
}

fn encode_binary(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

fn encode_text(text: &str, out: &mut Vec<u8>) {
    out.push(b'u');
    encode_binary(text.as_bytes(), out);
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode exactly one value; trailing bytes are an error.
pub fn decode(input: &[u8]) -> Result<Value, CodecError> {
    let mut decoder = Decoder {
        input,
        pos: 0,
        depth: 0,
    };
    let value = decoder.value()?;
    if decoder.pos != input.len() {
        return Err(CodecError::TrailingBytes(input.len() - decoder.pos));
    }
    Ok(value)
}

struct Decoder<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    fn peek(&self) -> Result<u8, CodecError> {
        self.input
            .get(self.pos)
            .copied()
            .ok_or(CodecError::UnexpectedEof(self.pos))
    }

    fn next(&mut self) -> Result<u8, CodecError> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.input.len())
            .ok_or(CodecError::UnexpectedEof(self.input.len()))?;
        let slice = &self.input[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn value(&mut self) -> Result<Value, CodecError> {
        let offset = self.pos;
        match self.peek()? {
            b'n' => {
                self.pos += 1;
                Ok(Value::Null)
            }
            b't' => {
                self.pos += 1;
                Ok(Value::Boolean(true))
            }
            b'f' => {
                self.pos += 1;
                Ok(Value::Boolean(false))
            }
            b'i' => {
                self.pos += 1;
                self.integer()
            }
            b'u' => {
                self.pos += 1;
                self.text().map(Value::Text)
            }
            b'0'..=b'9' => self.binary().map(Value::Binary),
            b'l' => {
                self.enter(offset)?;
                let mut items = Vec::new();
                while self.peek()? != b'e' {
                    items.push(self.value()?);
                }
                self.leave();
                Ok(Value::List(items))
            }
            b'd' => {
                self.enter(offset)?;
                let mut entries = BTreeMap::new();
                let mut last: Option<Key> = None;
                while self.peek()? != b'e' {
                    let key_offset = self.pos;
                    let key = self.key()?;
                    if last.as_ref().is_some_and(|prev| *prev >= key) {
                        return Err(CodecError::UnorderedKey(key_offset));
                    }
                    let item = self.value()?;
                    last = Some(key.clone());
                    entries.insert(key, item);
                }
                self.leave();
                Ok(Value::Dictionary(entries))
            }
            byte => Err(CodecError::UnexpectedByte { byte, offset }),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<(), CodecError> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::TooDeep(offset));
        }
        self.depth += 1;
        self.pos += 1;
        Ok(())
    }

    /// Consume the closing `e` of a container.
    fn leave(&mut self) {
        self.depth -= 1;
        self.pos += 1;
    }

    fn key(&mut self) -> Result<Key, CodecError> {
        let offset = self.pos;
        match self.peek()? {
            b'u' => {
                self.pos += 1;
                self.text().map(Key::Text)
            }
            b'0'..=b'9' => self.binary().map(Key::Binary),
            byte => Err(CodecError::UnexpectedByte { byte, offset }),
        }
    }

    fn integer(&mut self) -> Result<Value, CodecError> {
        let start = self.pos;
        while self.next()? != b'e' {}
        let digits = std::str::from_utf8(&self.input[start..self.pos - 1])
            .ok()
            .filter(|d| is_canonical_integer(d))
            .ok_or(CodecError::InvalidInteger(start))?;
        digits
            .parse::<i128>()
            .map(Value::Integer)
            .map_err(|_| CodecError::InvalidInteger(start))
    }

    fn length(&mut self) -> Result<usize, CodecError> {
        let start = self.pos;
        loop {
            match self.next()? {
                b':' => break,
                b'0'..=b'9' => {}
                byte => {
                    return Err(CodecError::UnexpectedByte {
                        byte,
                        offset: self.pos - 1,
                    })
                }
            }
        }
        std::str::from_utf8(&self.input[start..self.pos - 1])
            .ok()
            .filter(|s| is_canonical_integer(s) && !s.starts_with('-'))
            .and_then(|s| s.parse().ok())
            .ok_or(CodecError::InvalidInteger(start))
    }

    fn binary(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.length()?;
        Ok(self.take(len)?.to_vec())
    }

    fn text(&mut self) -> Result<String, CodecError> {
        let offset = self.pos;
        let len = self.length()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidText(offset))
    }
}

/// `0`, or an optional `-` followed by digits without a leading zero.
fn is_canonical_integer(digits: &str) -> bool {
    if digits == "0" {
        return true;
    }
    let magnitude = digits.strip_prefix('-').unwrap_or(digits);
    !magnitude.is_empty()
        && !magnitude.starts_with('0')
        && magnitude.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Display projection
// =============================================================================

/// Text marker that distinguishes strings from hex-rendered binaries.
pub const TEXT_MARKER: char = '\u{FEFF}';

/// Render a value as JSON for showing to the user.
///
/// Binaries become `0x` hex strings, text is prefixed with U+FEFF and
/// integers become decimal strings so no precision is lost.
pub fn to_display_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Boolean(b) => Json::Bool(*b),
        Value::Integer(i) => Json::String(i.to_string()),
        Value::Binary(bytes) => Json::String(format!("0x{}", hex::encode(bytes))),
        Value::Text(text) => Json::String(format!("{TEXT_MARKER}{text}")),
        Value::List(items) => Json::Array(items.iter().map(to_display_json).collect()),
        Value::Dictionary(entries) => {
            let map: Map<String, Json> = entries
                .iter()
                .map(|(key, item)| (display_key(key), to_display_json(item)))
                .collect();
            Json::Object(map)
        }
    }
}

fn display_key(key: &Key) -> String {
    match key {
        Key::Binary(bytes) => format!("0x{}", hex::encode(bytes)),
        Key::Text(text) => format!("{TEXT_MARKER}{text}"),
    }
}
