//! Recursive removal of empty-string and null values.
//!
//! Object children and array elements matching the enabled predicates are
//! dropped; arrays compact left with no holes. The traversal rebuilds each
//! container from its surviving children, which keeps insertion order
//! without any sibling splicing.

use serde_json::{Map, Value};

/// Remove empty-string and/or null values, recursively.
pub fn filter_value(v: Value, remove_empty_strings: bool, remove_nulls: bool) -> Value {
    if !remove_empty_strings && !remove_nulls {
        return v;
    }
    match v {
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, child) in map {
                if removable(&child, remove_empty_strings, remove_nulls) {
                    continue;
                }
                kept.insert(key, filter_value(child, remove_empty_strings, remove_nulls));
            }
            Value::Object(kept)
        }
        Value::Array(elements) => {
            let kept = elements
                .into_iter()
                .filter(|child| !removable(child, remove_empty_strings, remove_nulls))
                .map(|child| filter_value(child, remove_empty_strings, remove_nulls))
                .collect();
            Value::Array(kept)
        }
        scalar => scalar,
    }
}

fn removable(v: &Value, remove_empty_strings: bool, remove_nulls: bool) -> bool {
    match v {
        Value::String(s) => remove_empty_strings && s.is_empty(),
        Value::Null => remove_nulls,
        _ => false,
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn removes_empty_strings_and_nulls() {
        let input = json!({"name": "John", "email": "", "phone": "555", "address": null});
        let out = filter_value(input, true, true);
        assert_eq!(out, json!({"name": "John", "phone": "555"}));
    }

    #[test]
    fn flags_are_independent() {
        let input = json!({"a": "", "b": null});
        assert_eq!(filter_value(input.clone(), true, false), json!({"b": null}));
        assert_eq!(filter_value(input, false, true), json!({"a": ""}));
    }

    #[test]
    fn array_elements_shift_left() {
        let input = json!(["a", "", null, "b"]);
        assert_eq!(filter_value(input, true, true), json!(["a", "b"]));
    }

    #[test]
    fn recurses_into_survivors() {
        let input = json!({"outer": {"keep": 1, "drop": null, "inner": ["", "x"]}});
        let out = filter_value(input, true, true);
        assert_eq!(out, json!({"outer": {"keep": 1, "inner": ["x"]}}));
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(filter_value(json!(""), true, true), json!(""));
        assert_eq!(filter_value(json!(null), true, true), json!(null));
        assert_eq!(filter_value(json!(7), true, true), json!(7));
    }

    #[test]
    fn clean_input_is_unchanged() {
        let input = json!({"a": [1, 2, {"b": "x"}], "c": true});
        assert_eq!(filter_value(input.clone(), true, true), input);
    }

    #[test]
    fn containers_emptied_by_filtering_are_kept() {
        // Removal applies to empty strings and nulls only; a container that
        // becomes empty stays in place.
        let input = json!({"a": {"b": null}});
        assert_eq!(filter_value(input, true, true), json!({"a": {}}));
    }

    #[test]
    fn removal_order_is_commutative() {
        let input = json!({"a": "", "b": null, "c": {"d": "", "e": null, "f": [null, ""]}});
        let en = filter_value(filter_value(input.clone(), true, false), false, true);
        let ne = filter_value(filter_value(input, false, true), true, false);
        assert_eq!(en, ne);
    }
}
