//! Canonical JSON rendering for metadata hashing.

use serde_json::Value;

/// Renders `value` as compact JSON with object keys emitted in lexicographic
/// order at every nesting depth, so logically equal documents share a single
/// byte representation regardless of the key order they arrived with.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            // Sort explicitly; the backing map's iteration order is a serde_json
            // feature flag away from insertion order.
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).unwrap_or_default());
                out.push(':');
                write_value(item, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_keys_are_sorted() {
        let doc = json!({ "b": 2, "a": 1 });
        assert_eq!(canonical_json(&doc), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn nested_objects_are_sorted_too() {
        let doc = json!({ "outer": { "z": true, "a": [ { "k": 1, "b": 2 } ] } });
        assert_eq!(
            canonical_json(&doc),
            r#"{"outer":{"a":[{"b":2,"k":1}],"z":true}}"#
        );
    }

    #[test]
    fn array_order_is_preserved() {
        let doc = json!([3, 1, 2]);
        assert_eq!(canonical_json(&doc), "[3,1,2]");
    }

    #[test]
    fn strings_keep_json_escaping() {
        let doc = json!({ "title": "a \"quoted\" name" });
        assert_eq!(canonical_json(&doc), r#"{"title":"a \"quoted\" name"}"#);
    }
}
