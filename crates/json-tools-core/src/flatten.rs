//! Key-path flattening.
//!
//! Rewrites a JSON tree as a flat object from dotted/bracketed paths to the
//! leaves at those paths: `{"user":{"name":"John"}}` becomes
//! `{"user.name":"John"}`, `{"tags":["a"]}` becomes `{"tags[0]":"a"}`.
//!
//! Scalars flatten to themselves. A top-level array of scalars passes
//! through unchanged; an array containing any container flattens each
//! element independently into an array of results. Empty objects and arrays
//! are elided. A path that would exceed [`MAX_PATH_LEN`](crate::path::MAX_PATH_LEN)
//! fails the whole document; a partial object is never produced.

use serde_json::{Map, Value};
use tracing::debug;

use crate::arena::{ArenaRef, KeyArena, ARENA_KEY_LIMIT};
use crate::error::TransformError;
use crate::path::PathBuffer;
use crate::value::is_scalar;

/// Flatten a value per the container rules above.
pub fn flatten_value(v: Value) -> Result<Value, TransformError> {
    match v {
        Value::Object(_) => flatten_container(v),
        Value::Array(elements) => {
            if elements.iter().all(is_scalar) {
                return Ok(Value::Array(elements));
            }
            let flattened = elements
                .into_iter()
                .map(flatten_value)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(flattened))
        }
        scalar => Ok(scalar),
    }
}

/// Flatten one container document into a flat object.
fn flatten_container(v: Value) -> Result<Value, TransformError> {
    let mut pairs = FlatPairs::new();
    let mut path = PathBuffer::new();
    collect(v, &mut path, &mut pairs)?;
    debug!(leaves = pairs.len(), "flatten pass complete");
    Ok(pairs.into_object())
}

fn collect(
    v: Value,
    path: &mut PathBuffer,
    out: &mut FlatPairs,
) -> Result<(), TransformError> {
    match v {
        Value::Object(map) => {
            for (key, child) in map {
                let checkpoint = path.push_key(&key)?;
                collect(child, path, out)?;
                path.truncate(checkpoint);
            }
        }
        Value::Array(elements) => {
            for (index, child) in elements.into_iter().enumerate() {
                let checkpoint = path.push_index(index)?;
                collect(child, path, out)?;
                path.truncate(checkpoint);
            }
        }
        leaf => out.push(path.as_str(), leaf),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Pair buffer
// ---------------------------------------------------------------------------

enum FlatKey {
    Arena(ArenaRef),
    Heap(String),
}

/// Append-only buffer of `(path, leaf)` pairs produced by one flatten pass.
///
/// Small keys live in the arena; keys past [`ARENA_KEY_LIMIT`] take the heap
/// fallback. The output object is materialized in one sweep, after which the
/// arena storage is released wholesale.
struct FlatPairs {
    arena: KeyArena,
    pairs: Vec<(FlatKey, Value)>,
}

impl FlatPairs {
    fn new() -> Self {
        Self {
            arena: KeyArena::new(),
            pairs: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.pairs.len()
    }

    fn push(&mut self, key: &str, leaf: Value) {
        let key = if key.len() <= ARENA_KEY_LIMIT {
            FlatKey::Arena(self.arena.alloc_str(key))
        } else {
            FlatKey::Heap(key.to_owned())
        };
        self.pairs.push((key, leaf));
    }

    fn into_object(self) -> Value {
        let FlatPairs { arena, pairs } = self;
        let mut map = Map::new();
        for (key, leaf) in pairs {
            let key = match key {
                FlatKey::Arena(r) => arena.get(r).to_owned(),
                FlatKey::Heap(s) => s,
            };
            map.insert(key, leaf);
        }
        Value::Object(map)
    }
}

// ===========================================================================
// Tests
// ===========================================================================
