//! Reference resolution - inlines local `$ref` pointers.

use serde_json::{Map, Value};

use crate::error::CompileError;
use crate::types::{json_type_name, REF_KEY};

/// Resolve every `$ref` in `node` against `document`.
///
/// A mapping carrying `$ref` is replaced wholesale by the (recursively
/// resolved) target; its sibling keys are discarded. The result contains no
/// `$ref` keys.
///
/// # Errors
///
/// - `UnsupportedReference` for anything that is not a `#/...` fragment
/// - `UnresolvedReference` when the fragment names a missing location
/// - `CyclicReference` when a reference is re-entered while it is still
///   being expanded
/// - `MalformedDocument` for a non-string `$ref` value
pub fn resolve(node: &Value, document: &Value) -> Result<Value, CompileError> {
    let mut chain = Vec::new();
    resolve_value(node, document, "", &mut chain)
}

/// Walk a `#/a/b/c` fragment through `document`.
///
/// Segments are JSON Pointer encoded (`~1` = `/`, `~0` = `~`); numeric
/// segments index into arrays. A bare `#` names the whole document.
///
/// # Errors
///
/// Returns `UnsupportedReference` for non-fragment references and
/// `UnresolvedReference` when a segment is missing.
pub fn navigate_fragment<'a>(
    document: &'a Value,
    reference: &str,
) -> Result<&'a Value, CompileError> {
    let unsupported = || CompileError::UnsupportedReference {
        reference: reference.to_string(),
    };

    let pointer = reference.strip_prefix('#').ok_or_else(unsupported)?;
    if pointer.is_empty() {
        return Ok(document);
    }
    let pointer = pointer.strip_prefix('/').ok_or_else(unsupported)?;

    let mut current = document;
    for part in pointer.split('/') {
        let key = part.replace("~1", "/").replace("~0", "~");
        let next = match current {
            Value::Object(map) => map.get(&key),
            Value::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        };
        current = next.ok_or_else(|| CompileError::UnresolvedReference {
            reference: reference.to_string(),
        })?;
    }
    Ok(current)
}

// --- Internal implementation ---

fn resolve_value(
    value: &Value,
    document: &Value,
    path: &str,
    chain: &mut Vec<String>,
) -> Result<Value, CompileError> {
    match value {
        Value::Object(map) => resolve_object(map, document, path, chain),
        Value::Array(arr) => {
            let mut result = Vec::with_capacity(arr.len());
            for (i, item) in arr.iter().enumerate() {
                let item_path = format!("{}/{}", path, i);
                result.push(resolve_value(item, document, &item_path, chain)?);
            }
            Ok(Value::Array(result))
        }
        // Primitives pass through unchanged
        other => Ok(other.clone()),
    }
}

fn resolve_object(
    map: &Map<String, Value>,
    document: &Value,
    path: &str,
    chain: &mut Vec<String>,
) -> Result<Value, CompileError> {
    if let Some(reference) = map.get(REF_KEY) {
        let Value::String(reference) = reference else {
            return Err(CompileError::malformed(
                format!("{}/{}", path, REF_KEY),
                format!("expected string reference, got {}", json_type_name(reference)),
            ));
        };
        return resolve_reference(reference, document, path, chain);
    }

    let mut result = Map::new();
    for (key, value) in map {
        let child_path = format!("{}/{}", path, key);
        result.insert(key.clone(), resolve_value(value, document, &child_path, chain)?);
    }
    Ok(Value::Object(result))
}

fn resolve_reference(
    reference: &str,
    document: &Value,
    path: &str,
    chain: &mut Vec<String>,
) -> Result<Value, CompileError> {
    if chain.iter().any(|r| r == reference) {
        let mut cycle = chain.clone();
        cycle.push(reference.to_string());
        return Err(CompileError::CyclicReference { chain: cycle });
    }

    let target = navigate_fragment(document, reference)?;
    tracing::trace!(reference, at = path, "inlining reference");

    chain.push(reference.to_string());
    let resolved = resolve_value(target, document, path, chain);
    chain.pop();
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn components() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Id": { "type": "integer" },
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "$ref": "#/components/schemas/Id" },
                            "name": { "type": "string" }
                        }
                    },
                    "a~b": { "type": "boolean" },
                    "x/y": { "type": "number" }
                },
                "list": [{ "type": "null" }, { "type": "string" }]
            }
        })
    }

    // === Fragment Navigation Tests ===

    #[test]
    fn navigate_nested_fragment() {
        let doc = components();
        let target = navigate_fragment(&doc, "#/components/schemas/Id").unwrap();
        assert_eq!(target, &json!({ "type": "integer" }));
    }

    #[test]
    fn navigate_root_fragment() {
        let doc = components();
        assert_eq!(navigate_fragment(&doc, "#").unwrap(), &doc);
    }

    #[test]
    fn navigate_escaped_segments() {
        let doc = components();
        let target = navigate_fragment(&doc, "#/components/schemas/a~0b").unwrap();
        assert_eq!(target["type"], "boolean");
        let target = navigate_fragment(&doc, "#/components/schemas/x~1y").unwrap();
        assert_eq!(target["type"], "number");
    }

    #[test]
    fn navigate_array_index() {
        let doc = components();
        let target = navigate_fragment(&doc, "#/components/list/1").unwrap();
        assert_eq!(target["type"], "string");
    }

    #[test]
    fn navigate_missing_is_unresolved() {
        let doc = components();
        let result = navigate_fragment(&doc, "#/components/schemas/Nope");
        assert!(matches!(
            result,
            Err(CompileError::UnresolvedReference { reference }) if reference == "#/components/schemas/Nope"
        ));
    }

    #[test]
    fn navigate_external_is_unsupported() {
        let doc = components();
        for reference in ["other.yaml#/Pet", "https://example.com/s.json", "#components"] {
            assert!(matches!(
                navigate_fragment(&doc, reference),
                Err(CompileError::UnsupportedReference { .. })
            ));
        }
    }

    // === Resolution Tests ===

    #[test]
    fn resolve_replaces_ref_transitively() {
        let doc = components();
        let node = json!({ "schema": { "$ref": "#/components/schemas/User" } });
        let resolved = resolve(&node, &doc).unwrap();

        assert_eq!(resolved["schema"]["properties"]["id"], json!({ "type": "integer" }));
        assert_eq!(resolved["schema"]["properties"]["name"]["type"], "string");
    }

    #[test]
    fn resolve_discards_sibling_keys() {
        let doc = components();
        let node = json!({ "$ref": "#/components/schemas/Id", "description": "dropped" });
        let resolved = resolve(&node, &doc).unwrap();
        assert_eq!(resolved, json!({ "type": "integer" }));
    }

    #[test]
    fn resolve_arrays_and_scalars() {
        let doc = components();
        let node = json!([1, "two", null, { "$ref": "#/components/schemas/Id" }]);
        let resolved = resolve(&node, &doc).unwrap();
        assert_eq!(resolved, json!([1, "two", null, { "type": "integer" }]));
    }

    #[test]
    fn resolve_is_idempotent() {
        let doc = components();
        let node = json!({ "items": [{ "$ref": "#/components/schemas/User" }] });
        let once = resolve(&node, &doc).unwrap();
        let twice = resolve(&once, &doc).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_diamond_is_not_a_cycle() {
        let doc = components();
        let node = json!({
            "a": { "$ref": "#/components/schemas/Id" },
            "b": { "$ref": "#/components/schemas/Id" }
        });
        let resolved = resolve(&node, &doc).unwrap();
        assert_eq!(resolved["a"], resolved["b"]);
    }

    #[test]
    fn resolve_detects_self_cycle() {
        let doc = json!({
            "components": { "schemas": {
                "Node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/components/schemas/Node" } }
                }
            }}
        });
        let node = json!({ "$ref": "#/components/schemas/Node" });
        let result = resolve(&node, &doc);

        match result {
            Err(CompileError::CyclicReference { chain }) => {
                assert_eq!(
                    chain,
                    vec!["#/components/schemas/Node", "#/components/schemas/Node"]
                );
            }
            other => panic!("expected cyclic reference, got {:?}", other),
        }
    }

    #[test]
    fn resolve_detects_indirect_cycle() {
        let doc = json!({
            "A": { "$ref": "#/B" },
            "B": { "items": { "$ref": "#/A" } }
        });
        let result = resolve(&json!({ "$ref": "#/A" }), &doc);
        assert!(matches!(
            result,
            Err(CompileError::CyclicReference { chain }) if chain == ["#/A", "#/B", "#/A"]
        ));
    }

    #[test]
    fn resolve_non_string_ref_is_malformed() {
        let doc = components();
        let result = resolve(&json!({ "schema": { "$ref": 42 } }), &doc);
        assert!(matches!(
            result,
            Err(CompileError::MalformedDocument { path, .. }) if path == "/schema/$ref"
        ));
    }
}
