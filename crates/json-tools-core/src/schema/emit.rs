//! Draft-07 schema rendering.

use serde_json::{Map, Value};

use super::{SchemaKind, SchemaNode};

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// All concrete type names, for `Mixed` positions.
const MIXED_TYPES: &[&str] = &["string", "number", "integer", "boolean", "object", "array"];

/// Render a root schema node, with the `$schema` marker. Nested nodes are
/// rendered without it.
pub fn emit_root(node: &SchemaNode) -> Value {
    let mut map = Map::new();
    map.insert("$schema".to_owned(), Value::String(DRAFT_07.to_owned()));
    extend(&mut map, node);
    Value::Object(map)
}

fn emit(node: &SchemaNode) -> Value {
    let mut map = Map::new();
    extend(&mut map, node);
    Value::Object(map)
}

fn extend(map: &mut Map<String, Value>, node: &SchemaNode) {
    map.insert("type".to_owned(), type_value(node));
    match node.kind {
        SchemaKind::Array => {
            if let Some(items) = &node.items {
                map.insert("items".to_owned(), emit(items));
            }
        }
        SchemaKind::Object => {
            let mut properties = Map::new();
            for (name, prop) in &node.properties {
                properties.insert(name.clone(), emit(prop));
            }
            map.insert("properties".to_owned(), Value::Object(properties));

            let required: Vec<Value> = node
                .properties
                .iter()
                .filter(|(_, prop)| prop.required)
                .map(|(name, _)| Value::String(name.clone()))
                .collect();
            if !required.is_empty() {
                map.insert("required".to_owned(), Value::Array(required));
            }
        }
        _ => {}
    }
}

fn type_value(node: &SchemaNode) -> Value {
    match node.kind {
        SchemaKind::Mixed => {
            let mut types: Vec<Value> = MIXED_TYPES
                .iter()
                .map(|t| Value::String((*t).to_owned()))
                .collect();
            if node.nullable {
                types.push(Value::String("null".to_owned()));
            }
            Value::Array(types)
        }
        // A Null node is always nullable; "null" appears once.
        SchemaKind::Null => Value::String("null".to_owned()),
        kind => {
            // Concrete kinds always carry a name; Mixed was handled above.
            let name = kind.type_name().unwrap_or("null");
            if node.nullable {
                Value::Array(vec![
                    Value::String(name.to_owned()),
                    Value::String("null".to_owned()),
                ])
            } else {
                Value::String(name.to_owned())
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
