//! Path-with-type extraction.
//!
//! Maps every flattened path in a document to a type-name string from the
//! fixed vocabulary (`"null"`, `"boolean"`, `"integer"`, `"number"`,
//! `"string"`, `"array"`, `"object"`, `"unknown"`). Leaves report their own
//! type; empty containers keep their path and report `"array"`/`"object"`;
//! non-empty containers are replaced by their descendants' paths. A scalar
//! document reports under the fixed `"root"` path, as does a top-level
//! empty container.

use serde_json::{Map, Value};

use crate::error::TransformError;
use crate::path::PathBuffer;
use crate::value::type_name;

/// Extract the path → type-name mapping for a document.
pub fn paths_with_types(v: &Value) -> Result<Value, TransformError> {
    let empty_container = match v {
        Value::Object(map) => map.is_empty(),
        Value::Array(elements) => elements.is_empty(),
        scalar => {
            let mut map = Map::new();
            map.insert("root".to_owned(), Value::String(type_name(scalar).to_owned()));
            return Ok(Value::Object(map));
        }
    };
    if empty_container {
        let mut map = Map::new();
        map.insert("root".to_owned(), Value::String(type_name(v).to_owned()));
        return Ok(Value::Object(map));
    }

    let mut out = Map::new();
    let mut path = PathBuffer::new();
    collect(v, &mut path, &mut out)?;
    Ok(Value::Object(out))
}

fn collect(
    v: &Value,
    path: &mut PathBuffer,
    out: &mut Map<String, Value>,
) -> Result<(), TransformError> {
    match v {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                let checkpoint = path.push_key(key)?;
                collect(child, path, out)?;
                path.truncate(checkpoint);
            }
        }
        Value::Array(elements) if !elements.is_empty() => {
            for (index, child) in elements.iter().enumerate() {
                let checkpoint = path.push_index(index)?;
                collect(child, path, out)?;
                path.truncate(checkpoint);
            }
        }
        // Leaves and empty containers both keep their path.
        other => {
            out.insert(
                path.as_str().to_owned(),
                Value::String(type_name(other).to_owned()),
            );
        }
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
