//! High-throughput structural JSON transformations.
//!
//! The engine takes parsed JSON documents — single objects, arrays, or
//! heterogeneous batches — and produces derived artifacts through a fixed
//! set of operations:
//!
//! - **Flattening** ([`flatten`]): `{"user":{"name":"John"}}` becomes
//!   `{"user.name":"John"}`, with `[i]` steps for array descent.
//! - **Path-type extraction** ([`paths_with_types`]): every flattened path
//!   mapped to its type name.
//! - **Schema generation** ([`generate_schema`]): Draft-07 schema inference
//!   with cross-object merging over batches.
//! - **Filtering** ([`remove_empty_strings`], [`remove_nulls`]).
//! - **Regex rewriting** ([`replace_keys`], [`replace_values`]): whole-key /
//!   whole-value replacement with literal fast paths.
//!
//! Operations compose through the fluent [`Pipeline`], which applies queued
//! filters and rewrites in a single traversal and fans batch inputs out
//! across a work-stealing thread pool.
//!
//! ```
//! use json_tools_core::flatten;
//!
//! let out = flatten(br#"{"tags":["a","b"]}"#, false, None)?;
//! assert_eq!(out, br#"{"tags[0]":"a","tags[1]":"b"}"#);
//! # Ok::<(), json_tools_core::TransformError>(())
//! ```
//!
//! The byte-level functions below parse with the interchangeable
//! serde_json-backed seam in [`value`] and serialize compact or pretty
//! (two-space indentation). All failure modes are typed results; nothing
//! panics across the pipeline boundary.

mod arena;
mod deque;
mod error;
mod filter;
mod flatten;
mod path;
mod pipeline;
mod pool;
mod rewrite;
mod slab;
mod typemap;
mod value;

pub mod schema;

pub use error::TransformError;
pub use path::MAX_PATH_LEN;
pub use pipeline::{Pipeline, PipelineOptions, MIN_BATCH_FOR_MT};
pub use pool::{resolve_threads, DEQUE_CAPACITY, MAX_THREADS};
pub use rewrite::{CompiledPattern, MAX_REGEX_HAYSTACK};
pub use value::{is_scalar, kind_of, parse, print, type_name, version, ValueKind};

pub use filter::filter_value;
pub use flatten::flatten_value;
pub use typemap::paths_with_types as paths_with_types_value;

use serde_json::Value;

/// Flatten a document to dotted/bracketed key paths.
///
/// A top-level array is a batch: scalar-only arrays pass through, arrays
/// with container elements flatten per element, in parallel when the batch
/// is large enough and `threads` allows more than one worker.
pub fn flatten(json: &[u8], pretty: bool, threads: Option<usize>) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    let out = pipeline::flatten_with_threads(v, threads)?;
    to_bytes(&out, pretty)
}

/// Map every flattened path in a document to its type name.
pub fn paths_with_types(json: &[u8]) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    let out = typemap::paths_with_types(&v)?;
    to_bytes(&out, false)
}

/// Infer a Draft-07 JSON Schema. A top-level array is a batch: per-element
/// schemas are merged in input order.
pub fn generate_schema(
    json: &[u8],
    pretty: bool,
    threads: Option<usize>,
) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    let out = pipeline::schema_with_threads(v, threads)?;
    to_bytes(&out, pretty)
}

/// Recursively remove empty-string values.
pub fn remove_empty_strings(json: &[u8], pretty: bool) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    to_bytes(&filter::filter_value(v, true, false), pretty)
}

/// Recursively remove null values.
pub fn remove_nulls(json: &[u8], pretty: bool) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    to_bytes(&filter::filter_value(v, false, true), pretty)
}

/// Replace every object key matching `pattern` (whole-key replacement).
pub fn replace_keys(
    json: &[u8],
    pattern: &str,
    replacement: &str,
    pretty: bool,
) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    let op = rewrite::CompiledPattern::compile(pattern, replacement)?;
    to_bytes(&rewrite::replace_keys(v, &op), pretty)
}

/// Replace every string value matching `pattern` (whole-value replacement).
pub fn replace_values(
    json: &[u8],
    pattern: &str,
    replacement: &str,
    pretty: bool,
) -> Result<Vec<u8>, TransformError> {
    let v = value::parse(json)?;
    let op = rewrite::CompiledPattern::compile(pattern, replacement)?;
    to_bytes(&rewrite::replace_values(v, &op), pretty)
}

fn to_bytes(v: &Value, pretty: bool) -> Result<Vec<u8>, TransformError> {
    Ok(value::print(v, pretty)?.into_bytes())
}

// ===========================================================================
// Tests
// ===========================================================================
