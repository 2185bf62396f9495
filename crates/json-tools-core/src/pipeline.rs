//! The transformation pipeline: queued operations, compiled dispatch, and
//! batch fan-out.
//!
//! Operations queue on a [`Pipeline`] in fluent style and compile in one
//! step when the pipeline is built: replace patterns become
//! [`CompiledPattern`]s (failing fast on `InvalidPattern`) and the queued
//! set is summarized into an [`OpMask`] bitmask for O(1) dispatch checks.
//!
//! Execution applies every filtering and rewriting operation in a single
//! traversal — per node: key rewriting, then empty-string/null removal,
//! then value rewriting, then recursion into the survivors. `Flatten`
//! always runs last. Batch inputs (top-level arrays) fan out across the
//! work-stealing pool when they are large enough to pay for it, with
//! per-element results assembled in input order and the first error in
//! input order failing the whole call.

use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::TransformError;
use crate::flatten::flatten_value;
use crate::pool::{resolve_threads, ThreadPool};
use crate::rewrite::CompiledPattern;
use crate::schema::{emit_root, infer, merge, SchemaKind, SchemaNode};
use crate::value::{is_scalar, parse, print};

/// Arrays shorter than this are always processed on the calling thread.
pub const MIN_BATCH_FOR_MT: usize = 100;

/// How many elements to sample when judging whether a batch is worth
/// spinning up workers for.
const BATCH_SAMPLE_LIMIT: usize = 8;

// ---------------------------------------------------------------------------
// Operation records
// ---------------------------------------------------------------------------

/// A compiled, immutable operation record.
enum Operation {
    RemoveEmptyStrings,
    RemoveNulls,
    ReplaceKeys(CompiledPattern),
    ReplaceValues(CompiledPattern),
    Flatten,
}

impl Operation {
    fn mask_bit(&self) -> OpMask {
        match self {
            Operation::RemoveEmptyStrings => OpMask::REMOVE_EMPTY_STRINGS,
            Operation::RemoveNulls => OpMask::REMOVE_NULLS,
            Operation::ReplaceKeys(_) => OpMask::REPLACE_KEYS,
            Operation::ReplaceValues(_) => OpMask::REPLACE_VALUES,
            Operation::Flatten => OpMask::FLATTEN,
        }
    }
}

/// Bitmask over the queued operation variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OpMask(u8);

impl OpMask {
    const REMOVE_EMPTY_STRINGS: OpMask = OpMask(1 << 0);
    const REMOVE_NULLS: OpMask = OpMask(1 << 1);
    const REPLACE_KEYS: OpMask = OpMask(1 << 2);
    const REPLACE_VALUES: OpMask = OpMask(1 << 3);
    const FLATTEN: OpMask = OpMask(1 << 4);

    /// Operations handled by the single traversal pass.
    const TRAVERSAL: OpMask = OpMask(
        Self::REMOVE_EMPTY_STRINGS.0
            | Self::REMOVE_NULLS.0
            | Self::REPLACE_KEYS.0
            | Self::REPLACE_VALUES.0,
    );

    fn contains(self, other: OpMask) -> bool {
        self.0 & other.0 == other.0
    }

    fn intersects(self, other: OpMask) -> bool {
        self.0 & other.0 != 0
    }

    fn insert(&mut self, other: OpMask) {
        self.0 |= other.0;
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Per-call pipeline configuration. Serializable so embedding hosts can pass
/// it through as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
#[non_exhaustive]
pub struct PipelineOptions {
    /// Pretty-print the built output (two-space indentation).
    pub pretty: bool,
    /// Worker count for batch fan-out. `None` or `Some(0)` means auto.
    pub threads: Option<usize>,
}

// ---------------------------------------------------------------------------
// Pipeline builder
// ---------------------------------------------------------------------------

/// Raw queued form of an operation; patterns compile at build time.
enum QueuedOp {
    RemoveEmptyStrings,
    RemoveNulls,
    ReplaceKeys { pattern: String, replacement: String },
    ReplaceValues { pattern: String, replacement: String },
    Flatten,
}

/// Fluent transformation pipeline.
///
/// ```
/// use json_tools_core::Pipeline;
///
/// let out = Pipeline::new()
///     .add_json(br#"{"name":"John","email":"","tags":{"a":1}}"#)?
///     .remove_empty_strings()
///     .flatten()
///     .pretty_print(false)
///     .build()?;
/// assert_eq!(out, br#"{"name":"John","tags.a":1}"#);
/// # Ok::<(), json_tools_core::TransformError>(())
/// ```
#[derive(Default)]
pub struct Pipeline {
    input: Option<Value>,
    queued: Vec<QueuedOp>,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PipelineOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Parse and queue the input document.
    pub fn add_json(mut self, bytes: &[u8]) -> Result<Self, TransformError> {
        self.input = Some(parse(bytes)?);
        Ok(self)
    }

    /// Queue an already-parsed input document.
    pub fn add_value(mut self, v: Value) -> Self {
        self.input = Some(v);
        self
    }

    pub fn remove_empty_strings(mut self) -> Self {
        self.queued.push(QueuedOp::RemoveEmptyStrings);
        self
    }

    pub fn remove_nulls(mut self) -> Self {
        self.queued.push(QueuedOp::RemoveNulls);
        self
    }

    /// Queue a whole-key replacement; the pattern compiles at build time.
    pub fn replace_keys(mut self, pattern: &str, replacement: &str) -> Self {
        self.queued.push(QueuedOp::ReplaceKeys {
            pattern: pattern.to_owned(),
            replacement: replacement.to_owned(),
        });
        self
    }

    /// Queue a whole-value replacement; the pattern compiles at build time.
    pub fn replace_values(mut self, pattern: &str, replacement: &str) -> Self {
        self.queued.push(QueuedOp::ReplaceValues {
            pattern: pattern.to_owned(),
            replacement: replacement.to_owned(),
        });
        self
    }

    pub fn flatten(mut self) -> Self {
        self.queued.push(QueuedOp::Flatten);
        self
    }

    /// Worker count for batch fan-out; `0` means auto.
    pub fn threads(mut self, threads: usize) -> Self {
        self.options.threads = Some(threads);
        self
    }

    pub fn pretty_print(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    /// Compile and run the queued operations, serializing the result.
    pub fn build(mut self) -> Result<Vec<u8>, TransformError> {
        let input = self
            .input
            .take()
            .ok_or(TransformError::InternalInvariant(
                "pipeline built without an input document",
            ))?;
        let pretty = self.options.pretty;
        let output = self.run(input)?;
        Ok(print(&output, pretty)?.into_bytes())
    }

    /// Compile and run the queued operations on `input`, returning the tree.
    pub fn run(self, input: Value) -> Result<Value, TransformError> {
        let compiled = CompiledOps::compile(&self.queued)?;
        debug!(operations = self.queued.len(), "running pipeline");

        let mut v = input;
        if compiled.mask.intersects(OpMask::TRAVERSAL) {
            v = compiled.walk(v);
        }
        if compiled.mask.contains(OpMask::FLATTEN) {
            v = flatten_with_threads(v, self.options.threads)?;
        }
        Ok(v)
    }
}

// ---------------------------------------------------------------------------
// Compiled pipeline
// ---------------------------------------------------------------------------

struct CompiledOps {
    mask: OpMask,
    operations: Vec<Operation>,
}

impl CompiledOps {
    fn compile(queued: &[QueuedOp]) -> Result<Self, TransformError> {
        let mut mask = OpMask::default();
        let mut operations = Vec::with_capacity(queued.len());
        for op in queued {
            let compiled = match op {
                QueuedOp::RemoveEmptyStrings => Operation::RemoveEmptyStrings,
                QueuedOp::RemoveNulls => Operation::RemoveNulls,
                QueuedOp::ReplaceKeys {
                    pattern,
                    replacement,
                } => Operation::ReplaceKeys(CompiledPattern::compile(pattern, replacement)?),
                QueuedOp::ReplaceValues {
                    pattern,
                    replacement,
                } => Operation::ReplaceValues(CompiledPattern::compile(pattern, replacement)?),
                QueuedOp::Flatten => Operation::Flatten,
            };
            mask.insert(compiled.mask_bit());
            operations.push(compiled);
        }
        Ok(Self { mask, operations })
    }

    /// The single traversal pass: key rewriting, then child removal, then
    /// value rewriting, then recursion.
    fn walk(&self, v: Value) -> Value {
        match v {
            Value::Object(map) => {
                let mut rebuilt = Map::new();
                for (key, child) in map {
                    let key = self.rewrite_key(key);
                    if self.should_remove(&child) {
                        continue;
                    }
                    rebuilt.insert(key, self.walk(child));
                }
                Value::Object(rebuilt)
            }
            Value::Array(elements) => Value::Array(
                elements
                    .into_iter()
                    .filter(|child| !self.should_remove(child))
                    .map(|child| self.walk(child))
                    .collect(),
            ),
            Value::String(s) => Value::String(self.rewrite_string(s)),
            scalar => scalar,
        }
    }

    fn rewrite_key(&self, key: String) -> String {
        if !self.mask.intersects(OpMask::REPLACE_KEYS) {
            return key;
        }
        let mut key = key;
        for op in &self.operations {
            if let Operation::ReplaceKeys(pattern) = op {
                if pattern.matches(&key) {
                    key = pattern.replacement().to_owned();
                }
            }
        }
        key
    }

    fn rewrite_string(&self, s: String) -> String {
        if !self.mask.intersects(OpMask::REPLACE_VALUES) {
            return s;
        }
        let mut s = s;
        for op in &self.operations {
            if let Operation::ReplaceValues(pattern) = op {
                if pattern.matches(&s) {
                    s = pattern.replacement().to_owned();
                }
            }
        }
        s
    }

    fn should_remove(&self, child: &Value) -> bool {
        match child {
            Value::String(s) => {
                s.is_empty() && self.mask.intersects(OpMask::REMOVE_EMPTY_STRINGS)
            }
            Value::Null => self.mask.intersects(OpMask::REMOVE_NULLS),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Batch fan-out
// ---------------------------------------------------------------------------

/// Flatten with optional batch parallelism over a top-level array.
pub(crate) fn flatten_with_threads(
    v: Value,
    threads: Option<usize>,
) -> Result<Value, TransformError> {
    let elements = match v {
        Value::Array(elements) => elements,
        other => return flatten_value(other),
    };
    if elements.iter().all(is_scalar) {
        return Ok(Value::Array(elements));
    }
    let threads = resolve_threads(threads);
    if should_parallelize(&elements, threads) {
        trace!(len = elements.len(), threads, "flattening batch in parallel");
        let flattened = fan_out(elements, threads, flatten_value)?;
        return Ok(Value::Array(flattened));
    }
    let flattened = elements
        .into_iter()
        .map(flatten_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Array(flattened))
}

/// Draft-07 schema generation. A top-level array is a batch: one schema per
/// element (parallel when eligible), fold-merged in input order.
pub(crate) fn schema_with_threads(
    v: Value,
    threads: Option<usize>,
) -> Result<Value, TransformError> {
    let node = match v {
        Value::Array(elements) => {
            if elements.is_empty() {
                SchemaNode::leaf(SchemaKind::Object)
            } else {
                let threads = resolve_threads(threads);
                let nodes = if should_parallelize(&elements, threads) {
                    trace!(len = elements.len(), threads, "inferring batch in parallel");
                    fan_out(elements, threads, |v| Ok(infer(&v)))?
                } else {
                    elements.iter().map(infer).collect()
                };
                nodes
                    .into_iter()
                    .reduce(merge)
                    .ok_or(TransformError::InternalInvariant(
                        "empty schema batch after non-empty input",
                    ))?
            }
        }
        other => infer(&other),
    };
    Ok(emit_root(&node))
}

/// Whether a batch is worth fanning out: large enough, more than one
/// worker, and at least one sampled element that is a non-empty container.
fn should_parallelize(elements: &[Value], threads: usize) -> bool {
    if elements.len() < MIN_BATCH_FOR_MT || threads < 2 {
        return false;
    }
    let step = (elements.len() / BATCH_SAMPLE_LIMIT).max(1);
    elements
        .iter()
        .step_by(step)
        .take(BATCH_SAMPLE_LIMIT)
        .any(|v| match v {
            Value::Object(map) => !map.is_empty(),
            Value::Array(elements) => !elements.is_empty(),
            _ => false,
        })
}

/// Run `f` over every element on the pool, one task per element. Each task
/// writes its own index slot; results are assembled in input order and the
/// first error in input order fails the batch.
fn fan_out<R, F>(elements: Vec<Value>, threads: usize, f: F) -> Result<Vec<R>, TransformError>
where
    R: Send + Sync + 'static,
    F: Fn(Value) -> Result<R, TransformError> + Send + Sync + 'static,
{
    let pool = ThreadPool::new(threads)?;
    let total = elements.len();
    let slots: Arc<Vec<OnceLock<Result<R, TransformError>>>> =
        Arc::new((0..total).map(|_| OnceLock::new()).collect());
    let f = Arc::new(f);

    for (index, element) in elements.into_iter().enumerate() {
        let slots = Arc::clone(&slots);
        let f = Arc::clone(&f);
        pool.submit(move || {
            let _ = slots[index].set(f(element));
        });
    }
    pool.wait_all();
    drop(pool);

    let slots = Arc::try_unwrap(slots).map_err(|_| {
        TransformError::InternalInvariant("batch slots still shared after wait_all")
    })?;
    let mut results = Vec::with_capacity(total);
    for slot in slots {
        match slot.into_inner() {
            Some(Ok(value)) => results.push(value),
            Some(Err(err)) => return Err(err),
            None => {
                return Err(TransformError::InternalInvariant(
                    "batch slot was never filled",
                ))
            }
        }
    }
    Ok(results)
}

// ===========================================================================
// Tests
// ===========================================================================
