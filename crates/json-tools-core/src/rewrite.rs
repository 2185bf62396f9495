//! Regex-based key and value rewriting.
//!
//! Both operations replace the *entire* key or string value with the
//! configured replacement whenever the pattern matches anywhere in it
//! (first match only). Patterns compile once per operation record; pure
//! literals — no metacharacters beyond edge anchors — skip the regex engine
//! entirely and match with `contains`/`starts_with`/`ends_with`/equality
//! picked by the `^`/`$` anchors.

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TransformError;

/// Scalars longer than this skip replacement and pass through unchanged.
pub const MAX_REGEX_HAYSTACK: usize = 10_000;

/// Regex metacharacters; a pattern containing any of these (beyond edge
/// anchors) takes the compiled-regex path.
const METACHARACTERS: &[char] = &[
    '^', '$', '.', '*', '+', '?', '[', ']', '{', '}', '(', ')', '\\', '|',
];

#[derive(Debug, Clone)]
enum Matcher {
    Equals(String),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Regex(regex::Regex),
}

/// A compiled replace operation: pattern, replacement, and the matcher
/// chosen at compile time. Immutable after compilation and shareable across
/// worker threads.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pattern: String,
    replacement: String,
    matcher: Matcher,
}

impl CompiledPattern {
    /// Compile `pattern`, recognizing the literal fast path.
    pub fn compile(pattern: &str, replacement: &str) -> Result<Self, TransformError> {
        let matcher = match literal_matcher(pattern) {
            Some(m) => m,
            None => Matcher::Regex(regex::Regex::new(pattern).map_err(|source| {
                TransformError::InvalidPattern {
                    pattern: pattern.to_owned(),
                    source,
                }
            })?),
        };
        Ok(Self {
            pattern: pattern.to_owned(),
            replacement: replacement.to_owned(),
            matcher,
        })
    }

    /// The original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The replacement text.
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Whether the pattern matches `haystack`. Oversized haystacks never
    /// match; the skip is a logged degradation, not an error.
    pub fn matches(&self, haystack: &str) -> bool {
        if haystack.len() > MAX_REGEX_HAYSTACK {
            debug!(
                len = haystack.len(),
                limit = MAX_REGEX_HAYSTACK,
                "skipping replacement on oversized input"
            );
            return false;
        }
        match &self.matcher {
            Matcher::Equals(lit) => haystack == lit,
            Matcher::StartsWith(lit) => haystack.starts_with(lit),
            Matcher::EndsWith(lit) => haystack.ends_with(lit),
            Matcher::Contains(lit) => haystack.contains(lit),
            Matcher::Regex(re) => re.is_match(haystack),
        }
    }
}

/// Recognize a pattern with no metacharacters beyond edge anchors and pick
/// the corresponding literal matcher.
fn literal_matcher(pattern: &str) -> Option<Matcher> {
    let anchored_start = pattern.starts_with('^');
    let anchored_end = pattern.ends_with('$') && pattern != "^";
    let body = &pattern[usize::from(anchored_start)..pattern.len() - usize::from(anchored_end)];
    if body.contains(METACHARACTERS) {
        return None;
    }
    let body = body.to_owned();
    Some(match (anchored_start, anchored_end) {
        (true, true) => Matcher::Equals(body),
        (true, false) => Matcher::StartsWith(body),
        (false, true) => Matcher::EndsWith(body),
        (false, false) => Matcher::Contains(body),
    })
}

/// Replace every matching object key, recursively. Values are traversed for
/// nested objects but string values are left untouched.
pub fn replace_keys(v: Value, op: &CompiledPattern) -> Value {
    match v {
        Value::Object(map) => {
            let mut rebuilt = Map::new();
            for (key, child) in map {
                let key = if op.matches(&key) {
                    op.replacement().to_owned()
                } else {
                    key
                };
                rebuilt.insert(key, replace_keys(child, op));
            }
            Value::Object(rebuilt)
        }
        Value::Array(elements) => {
            Value::Array(elements.into_iter().map(|e| replace_keys(e, op)).collect())
        }
        scalar => scalar,
    }
}

/// Replace every matching string value, recursively. Keys and non-string
/// values are untouched.
pub fn replace_values(v: Value, op: &CompiledPattern) -> Value {
    match v {
        Value::Object(map) => {
            let rebuilt = map
                .into_iter()
                .map(|(key, child)| (key, replace_values(child, op)))
                .collect();
            Value::Object(rebuilt)
        }
        Value::Array(elements) => Value::Array(
            elements
                .into_iter()
                .map(|e| replace_values(e, op))
                .collect(),
        ),
        Value::String(s) => {
            if op.matches(&s) {
                Value::String(op.replacement().to_owned())
            } else {
                Value::String(s)
            }
        }
        scalar => scalar,
    }
}

// ===========================================================================
// Tests
// ===========================================================================
