//! Scalar values, their byte encoding, and generated keys

use std::fmt;

use uuid::Uuid;

use crate::error::{Error, Result};

/// Scalar value accepted by [`Cache::store`](crate::Cache::store)
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// UTF-8 text
    Text(String),
    /// Opaque bytes
    Bytes(Vec<u8>),
    /// Signed integer, stored as decimal text
    Int(i64),
    /// Floating point, stored as its shortest round-trip decimal text
    Float(f64),
}

/// Variant tag used to decode raw bytes back into a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Decode as UTF-8 text
    Text,
    /// Keep the raw bytes
    Bytes,
    /// Parse as a decimal integer
    Int,
    /// Parse as a float
    Float,
}

impl Value {
    /// Encode the value the way it is written to the store
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Value::Text(s) => s.as_bytes().to_vec(),
            Value::Bytes(b) => b.clone(),
            Value::Int(i) => i.to_string().into_bytes(),
            Value::Float(f) => f.to_string().into_bytes(),
        }
    }

    /// Variant tag of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Bytes(_) => ValueKind::Bytes,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
        }
    }

    /// Decode raw bytes as the given variant
    pub fn decode(kind: ValueKind, raw: &[u8]) -> Result<Value> {
        match kind {
            ValueKind::Text => as_text(raw).map(Value::Text),
            ValueKind::Bytes => Ok(Value::Bytes(as_bytes(raw)?)),
            ValueKind::Int => as_int(raw).map(Value::Int),
            ValueKind::Float => as_float(raw).map(Value::Float),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

/// Converter: raw bytes to UTF-8 text
pub fn as_text(raw: &[u8]) -> Result<String> {
    String::from_utf8(raw.to_vec()).map_err(|e| Error::Conversion(format!("invalid UTF-8: {}", e)))
}

/// Converter: raw bytes unchanged
pub fn as_bytes(raw: &[u8]) -> Result<Vec<u8>> {
    Ok(raw.to_vec())
}

/// Converter: raw bytes to a decimal integer
pub fn as_int(raw: &[u8]) -> Result<i64> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::Conversion(format!("invalid UTF-8: {}", e)))?;
    text.trim()
        .parse()
        .map_err(|_| Error::Conversion(format!("not an integer: {:?}", text)))
}

/// Converter: raw bytes to a float
pub fn as_float(raw: &[u8]) -> Result<f64> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| Error::Conversion(format!("invalid UTF-8: {}", e)))?;
    text.trim()
        .parse()
        .map_err(|_| Error::Conversion(format!("not a float: {:?}", text)))
}

/// Opaque key returned by [`Cache::store`](crate::Cache::store)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    /// Fresh random (v4) UUID key
    pub fn generate() -> Self {
        Key(Uuid::new_v4().to_string())
    }

    /// Key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key(s)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key(s.to_string())
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
