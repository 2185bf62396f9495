//! Cross-document schema merging.
//!
//! The merge is associative and commutative on kinds, nullability, and
//! required flags; property insertion order is first-seen across the merge
//! sequence. `Null` never changes the other side's kind — it only records
//! nullability. `Integer` widens with `Number`; any other pair of distinct
//! concrete kinds collapses to `Mixed`.

use indexmap::IndexMap;

use super::{SchemaKind, SchemaNode};

/// Merge two schema nodes observed at the same position.
pub fn merge(a: SchemaNode, b: SchemaNode) -> SchemaNode {
    let nullable = a.nullable || b.nullable;
    let required = a.required && b.required;

    // Null absorbs into the other side's nullability.
    if a.kind == SchemaKind::Null {
        let mut node = b;
        node.nullable = true;
        node.required = required;
        return node;
    }
    if b.kind == SchemaKind::Null {
        let mut node = a;
        node.nullable = true;
        node.required = required;
        return node;
    }

    if a.kind == b.kind {
        let mut node = match a.kind {
            SchemaKind::Array => {
                let mut node = SchemaNode::leaf(SchemaKind::Array);
                node.items = merge_items(a.items, b.items);
                node
            }
            SchemaKind::Object => {
                let mut node = SchemaNode::leaf(SchemaKind::Object);
                node.properties = merge_properties(a.properties, b.properties);
                node
            }
            kind => SchemaNode::leaf(kind),
        };
        node.nullable = nullable;
        node.required = required;
        return node;
    }

    // Numeric widening.
    let widened = matches!(
        (a.kind, b.kind),
        (SchemaKind::Integer, SchemaKind::Number) | (SchemaKind::Number, SchemaKind::Integer)
    );
    let mut node = SchemaNode::leaf(if widened {
        SchemaKind::Number
    } else {
        SchemaKind::Mixed
    });
    node.nullable = nullable;
    node.required = required;
    node
}

fn merge_items(
    a: Option<Box<SchemaNode>>,
    b: Option<Box<SchemaNode>>,
) -> Option<Box<SchemaNode>> {
    match (a, b) {
        (Some(x), Some(y)) => Some(Box::new(merge(*x, *y))),
        // One side only ever saw empty arrays: the element schema holds but
        // becomes nullable.
        (Some(x), None) | (None, Some(x)) => {
            let mut items = *x;
            items.nullable = true;
            Some(Box::new(items))
        }
        (None, None) => None,
    }
}

fn merge_properties(
    a: IndexMap<String, SchemaNode>,
    b: IndexMap<String, SchemaNode>,
) -> IndexMap<String, SchemaNode> {
    let mut remaining = b;
    let mut merged = IndexMap::with_capacity(a.len() + remaining.len());
    for (name, a_prop) in a {
        match remaining.shift_remove(&name) {
            Some(b_prop) => {
                merged.insert(name, merge(a_prop, b_prop));
            }
            None => {
                merged.insert(name, demote(a_prop));
            }
        }
    }
    for (name, b_prop) in remaining {
        merged.insert(name, demote(b_prop));
    }
    merged
}

/// A property present on only one side of a merge: optional and nullable.
fn demote(mut prop: SchemaNode) -> SchemaNode {
    prop.required = false;
    prop.nullable = true;
    prop
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::super::infer;
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn like_kinds_merge_to_themselves() {
        let merged = merge(infer(&json!("a")), infer(&json!("b")));
        assert_eq!(merged.kind, SchemaKind::String);
        assert!(!merged.nullable);
        assert!(merged.required);
    }

    #[test]
    fn null_only_toggles_nullability() {
        let merged = merge(infer(&json!(null)), infer(&json!(7)));
        assert_eq!(merged.kind, SchemaKind::Integer);
        assert!(merged.nullable);
        assert!(!merged.required);

        let flipped = merge(infer(&json!(7)), infer(&json!(null)));
        assert_eq!(flipped.kind, SchemaKind::Integer);
        assert!(flipped.nullable);
    }

    #[test]
    fn integer_widens_with_number() {
        assert_eq!(
            merge(infer(&json!(1)), infer(&json!(1.5))).kind,
            SchemaKind::Number
        );
        assert_eq!(
            merge(infer(&json!(1.5)), infer(&json!(1))).kind,
            SchemaKind::Number
        );
    }

    #[test]
    fn other_heterogeneous_pairs_are_mixed() {
        assert_eq!(
            merge(infer(&json!("a")), infer(&json!(1))).kind,
            SchemaKind::Mixed
        );
        assert_eq!(
            merge(infer(&json!({"a": 1})), infer(&json!([1]))).kind,
            SchemaKind::Mixed
        );
    }

    #[test]
    fn mixed_stays_mixed() {
        let mixed = merge(infer(&json!("a")), infer(&json!(1)));
        let merged = merge(mixed, infer(&json!(true)));
        assert_eq!(merged.kind, SchemaKind::Mixed);
    }

    #[test]
    fn shared_properties_and_required_flags() {
        let a = infer(&json!({"id": 1, "name": "a"}));
        let b = infer(&json!({"id": 2, "name": "b", "active": true}));
        let merged = merge(a, b);

        assert!(merged.properties["id"].required);
        assert!(merged.properties["name"].required);
        let active = &merged.properties["active"];
        assert!(!active.required);
        assert!(active.nullable);
        assert_eq!(active.kind, SchemaKind::Boolean);
    }

    #[test]
    fn property_order_is_first_seen_across_the_sequence() {
        let a = infer(&json!({"b": 1, "a": 1}));
        let b = infer(&json!({"c": 1, "a": 1}));
        let merged = merge(a, b);
        let names: Vec<&String> = merged.properties.keys().collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn array_items_merge_pairwise() {
        let merged = merge(infer(&json!([1])), infer(&json!([2.5])));
        assert_eq!(merged.items.unwrap().kind, SchemaKind::Number);
    }

    #[test]
    fn empty_array_side_makes_items_nullable() {
        let merged = merge(infer(&json!([1])), infer(&json!([])));
        let items = merged.items.unwrap();
        assert_eq!(items.kind, SchemaKind::Integer);
        assert!(items.nullable);
    }

    #[test]
    fn reordering_preserves_kinds_and_flags() {
        let docs = [
            json!({"id": 1, "name": "a"}),
            json!({"id": 2.5, "active": true}),
            json!({"id": null, "name": "c"}),
        ];
        let forward = docs.iter().map(infer).reduce(merge).unwrap();
        let backward = docs.iter().rev().map(infer).reduce(merge).unwrap();

        for name in ["id", "name", "active"] {
            let f = &forward.properties[name];
            let b = &backward.properties[name];
            assert_eq!(f.kind, b.kind, "kind mismatch on {name}");
            assert_eq!(f.nullable, b.nullable, "nullable mismatch on {name}");
            assert_eq!(f.required, b.required, "required mismatch on {name}");
        }
        assert_eq!(forward.properties["id"].kind, SchemaKind::Number);
        assert!(forward.properties["id"].nullable);
    }
}
