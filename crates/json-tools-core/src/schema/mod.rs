//! Schema inference, merging, and Draft-07 emission.
//!
//! [`infer`] builds a [`SchemaNode`] lattice element per document,
//! [`merge`] folds nodes across a batch, and [`emit_root`] renders the
//! result as a Draft-07 JSON Schema.

mod emit;
mod infer;
mod merge;

pub use emit::emit_root;
pub use infer::{infer, ARRAY_SAMPLE_LIMIT};
pub use merge::merge;

use indexmap::IndexMap;

/// Inferred type lattice: concrete kinds, plus `Mixed` once two
/// incompatible concrete kinds have been observed at one position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
    Mixed,
}

impl SchemaKind {
    /// Draft-07 type name. `Mixed` has no single name and is rendered as a
    /// type list by the emitter.
    pub(crate) fn type_name(self) -> Option<&'static str> {
        match self {
            SchemaKind::Null => Some("null"),
            SchemaKind::Boolean => Some("boolean"),
            SchemaKind::Integer => Some("integer"),
            SchemaKind::Number => Some("number"),
            SchemaKind::String => Some("string"),
            SchemaKind::Array => Some("array"),
            SchemaKind::Object => Some("object"),
            SchemaKind::Mixed => None,
        }
    }
}

/// One node of an inferred schema.
///
/// `nullable` records a `Null` observation at this position; `required`
/// records presence in every observation that reached it. Array element
/// schemas live in `items` (`None` until a non-empty array is seen); object
/// properties preserve first-seen insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: SchemaKind,
    pub nullable: bool,
    pub required: bool,
    pub items: Option<Box<SchemaNode>>,
    pub properties: IndexMap<String, SchemaNode>,
}

impl SchemaNode {
    /// A leaf node of the given kind, present and non-null.
    pub(crate) fn leaf(kind: SchemaKind) -> Self {
        Self {
            kind,
            nullable: false,
            required: true,
            items: None,
            properties: IndexMap::new(),
        }
    }

    /// The node for an observed JSON `null`.
    pub(crate) fn null() -> Self {
        Self {
            kind: SchemaKind::Null,
            nullable: true,
            required: false,
            items: None,
            properties: IndexMap::new(),
        }
    }
}
