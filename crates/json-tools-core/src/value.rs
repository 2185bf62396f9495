//! Value-model seam: kind classification and the parser/serializer boundary.
//!
//! The in-memory tree is [`serde_json::Value`] with `preserve_order`, which
//! gives insertion-ordered objects and an exact integer/double split on
//! numbers. This module adds what the raw `Value` lacks: a [`ValueKind`]
//! taxonomy with the fixed type-name vocabulary used by the path-type
//! extractor and the schema inferencer, plus `parse`/`print`, the only two
//! points where bytes enter or leave the engine.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransformError;

/// Classification of a JSON value, with integers split out of numbers.
///
/// A number is `Integer` iff it is exactly representable as a signed 64-bit
/// integer with no fractional part; everything else is `Number`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    /// A number representable as neither `i64` nor `f64`. Unreachable with
    /// the default serde_json number model; kept so the type-name
    /// vocabulary is total.
    Unknown,
}

impl ValueKind {
    /// The wire-level type-name string for this kind.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::Unknown => "unknown",
        }
    }
}

/// Classify a value into its [`ValueKind`].
pub fn kind_of(v: &Value) -> ValueKind {
    match v {
        Value::Null => ValueKind::Null,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Number(n) => {
            if n.is_i64() {
                ValueKind::Integer
            } else if n.is_u64() || n.is_f64() {
                ValueKind::Number
            } else {
                ValueKind::Unknown
            }
        }
        Value::String(_) => ValueKind::String,
        Value::Array(_) => ValueKind::Array,
        Value::Object(_) => ValueKind::Object,
    }
}

/// The wire-level type-name string for a value.
pub fn type_name(v: &Value) -> &'static str {
    kind_of(v).name()
}

/// True for every non-container value (anything but objects and arrays).
pub fn is_scalar(v: &Value) -> bool {
    !matches!(v, Value::Array(_) | Value::Object(_))
}

/// Parse raw bytes into a value tree.
pub fn parse(bytes: &[u8]) -> Result<Value, TransformError> {
    serde_json::from_slice(bytes).map_err(TransformError::from)
}

/// Serialize a value tree.
///
/// Pretty form uses two-space indentation and newlines; compact form omits
/// all whitespace.
pub fn print(v: &Value, pretty: bool) -> Result<String, TransformError> {
    let out = if pretty {
        serde_json::to_string_pretty(v)?
    } else {
        serde_json::to_string(v)?
    };
    Ok(out)
}

/// Library version, for host surfaces.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ===========================================================================
// Tests
// ===========================================================================
