//! Per-document schema inference.

use serde_json::Value;

use super::{merge, SchemaKind, SchemaNode};
use crate::value::{kind_of, ValueKind};

/// Arrays are sampled at up to this many evenly spaced elements.
pub const ARRAY_SAMPLE_LIMIT: usize = 50;

/// Infer the schema lattice node for one document.
pub fn infer(v: &Value) -> SchemaNode {
    match v {
        Value::Null => SchemaNode::null(),
        Value::Bool(_) => SchemaNode::leaf(SchemaKind::Boolean),
        Value::Number(_) => match kind_of(v) {
            ValueKind::Integer => SchemaNode::leaf(SchemaKind::Integer),
            _ => SchemaNode::leaf(SchemaKind::Number),
        },
        Value::String(_) => SchemaNode::leaf(SchemaKind::String),
        Value::Array(elements) => {
            let mut node = SchemaNode::leaf(SchemaKind::Array);
            node.items = sample(elements)
                .map(infer)
                .reduce(merge)
                .map(Box::new);
            node
        }
        Value::Object(map) => {
            let mut node = SchemaNode::leaf(SchemaKind::Object);
            node.properties = map.iter().map(|(k, child)| (k.clone(), infer(child))).collect();
            node
        }
    }
}

/// Up to [`ARRAY_SAMPLE_LIMIT`] evenly spaced elements, in order.
fn sample(elements: &[Value]) -> impl Iterator<Item = &Value> {
    let step = if elements.len() <= ARRAY_SAMPLE_LIMIT {
        1
    } else {
        elements.len() / ARRAY_SAMPLE_LIMIT
    };
    elements.iter().step_by(step).take(ARRAY_SAMPLE_LIMIT)
}

// ===========================================================================
// Tests
// ===========================================================================
