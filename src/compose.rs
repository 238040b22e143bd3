//! Schema composition - flattens `allOf` into single object schemas.
//!
//! OpenAPI documents commonly build request bodies out of several partial
//! schemas:
//!
//! ```yaml
//! allOf:
//!   - $ref: '#/components/schemas/NewPet'
//!   - required: [id]
//!     properties:
//!       id: { type: integer }
//! ```
//!
//! After reference resolution every branch is an inline mapping, and the
//! branches can be folded into one schema:
//!
//! | Key | Merge rule |
//! |-----|------------|
//! | `properties` | deep union, later branch wins on non-mapping collisions |
//! | `required` | union, first occurrence order, no duplicates |
//! | `type` | always `"object"` |
//!
//! Other keys on the branches (`description`, `format`, ...) are not carried
//! over. Composing non-object schemas is not meaningful; it degrades to an
//! empty object rather than failing.

use serde_json::{Map, Value};

use crate::types::ALL_OF_KEY;

/// Flatten every `allOf` node in `node`.
///
/// A mapping carrying `allOf` is replaced by the merged schema. The merge
/// result is walked again, so compositions nested inside merged properties
/// are flattened too. The output never contains an `allOf` key, and
/// `merge_all_of(&merge_all_of(x)) == merge_all_of(x)`.
pub fn merge_all_of(node: &Value) -> Value {
    match node {
        Value::Object(map) => match map.get(ALL_OF_KEY) {
            Some(parts) => {
                let merged = merge_partials(parts);
                merge_all_of(&merged)
            }
            None => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), merge_all_of(v)))
                    .collect(),
            ),
        },
        Value::Array(arr) => Value::Array(arr.iter().map(merge_all_of).collect()),
        other => other.clone(),
    }
}

/// Returns true if any mapping in `node` still carries `allOf`.
pub fn has_composition(node: &Value) -> bool {
    match node {
        Value::Object(map) => map.contains_key(ALL_OF_KEY) || map.values().any(has_composition),
        Value::Array(arr) => arr.iter().any(has_composition),
        _ => false,
    }
}

// --- Internal implementation ---

fn merge_partials(parts: &Value) -> Value {
    let partials = normalize(parts);
    tracing::trace!(branches = partials.len(), "merging allOf");

    let mut properties = Map::new();
    let mut required: Vec<Value> = Vec::new();

    for partial in &partials {
        if let Some(Value::Object(props)) = partial.get("properties") {
            deep_merge(&mut properties, props);
        }
        if let Some(Value::Array(names)) = partial.get("required") {
            for name in names {
                if !required.contains(name) {
                    required.push(name.clone());
                }
            }
        }
    }

    let mut merged = Map::new();
    merged.insert("type".to_string(), Value::String("object".to_string()));
    merged.insert("properties".to_string(), Value::Object(properties));
    merged.insert("required".to_string(), Value::Array(required));
    Value::Object(merged)
}

/// Expand an `allOf` list into the flat list of partial schemas it names.
///
/// A branch that is itself a composition contributes its own branches, plus
/// its sibling `properties`/`required` when it has any. Non-mapping branches
/// contribute nothing.
fn normalize(parts: &Value) -> Vec<Map<String, Value>> {
    let branches: &[Value] = match parts {
        Value::Array(arr) => arr,
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => &[],
    };

    let mut out = Vec::new();
    for branch in branches {
        let Value::Object(map) = branch else {
            continue;
        };
        match map.get(ALL_OF_KEY) {
            Some(nested) => {
                out.extend(normalize(nested));
                if map.contains_key("properties") || map.contains_key("required") {
                    let mut rest = map.clone();
                    rest.remove(ALL_OF_KEY);
                    out.push(rest);
                }
            }
            None => out.push(map.clone()),
        }
    }
    out
}

fn deep_merge(base: &mut Map<String, Value>, additional: &Map<String, Value>) {
    for (key, value) in additional {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_properties_and_required() {
        let schema = json!({
            "allOf": [
                { "required": ["id"], "properties": { "id": { "type": "integer" } } },
                { "required": ["name"], "properties": { "name": { "type": "string" } } }
            ]
        });
        let merged = merge_all_of(&schema);

        assert_eq!(merged["type"], "object");
        assert_eq!(merged["required"], json!(["id", "name"]));
        assert_eq!(merged["properties"]["id"]["type"], "integer");
        assert_eq!(merged["properties"]["name"]["type"], "string");
    }

    #[test]
    fn required_union_deduplicates_in_first_occurrence_order() {
        let schema = json!({
            "allOf": [
                { "required": ["name", "id"] },
                { "required": ["id", "email", "name"] }
            ]
        });
        let merged = merge_all_of(&schema);
        assert_eq!(merged["required"], json!(["name", "id", "email"]));
    }

    #[test]
    fn colliding_mappings_deep_merge() {
        let schema = json!({
            "allOf": [
                { "properties": { "address": { "type": "object", "properties": { "city": { "type": "string" } } } } },
                { "properties": { "address": { "properties": { "zip": { "type": "string" } } } } }
            ]
        });
        let merged = merge_all_of(&schema);
        let address = &merged["properties"]["address"];

        assert_eq!(address["type"], "object");
        assert_eq!(address["properties"]["city"]["type"], "string");
        assert_eq!(address["properties"]["zip"]["type"], "string");
    }

    #[test]
    fn colliding_scalars_later_wins() {
        let schema = json!({
            "allOf": [
                { "properties": { "id": { "type": "string", "format": "uuid" } } },
                { "properties": { "id": { "type": "integer" } } }
            ]
        });
        let merged = merge_all_of(&schema);
        assert_eq!(merged["properties"]["id"], json!({ "type": "integer", "format": "uuid" }));
    }

    #[test]
    fn nested_composition_branches_are_flattened() {
        let schema = json!({
            "allOf": [
                { "allOf": [
                    { "required": ["a"], "properties": { "a": { "type": "string" } } },
                    { "properties": { "b": { "type": "string" } } }
                ]},
                { "required": ["c"], "properties": { "c": { "type": "string" } } }
            ]
        });
        let merged = merge_all_of(&schema);

        assert_eq!(merged["required"], json!(["a", "c"]));
        let keys: Vec<&String> = merged["properties"].as_object().unwrap().keys().collect();
        assert_eq!(keys, ["a", "b", "c"]);
        assert!(!has_composition(&merged));
    }

    #[test]
    fn composition_inside_properties_is_flattened() {
        let schema = json!({
            "type": "object",
            "properties": {
                "owner": { "allOf": [
                    { "properties": { "id": { "type": "integer" } } },
                    { "properties": { "email": { "type": "string" } } }
                ]}
            },
            "items": [{ "allOf": [{ "required": ["x"] }] }]
        });
        let merged = merge_all_of(&schema);

        assert_eq!(merged["type"], "object");
        assert_eq!(merged["properties"]["owner"]["type"], "object");
        assert!(merged["properties"]["owner"]["properties"]["email"].is_object());
        assert_eq!(merged["items"][0]["required"], json!(["x"]));
        assert!(!has_composition(&merged));
    }

    #[test]
    fn composition_surviving_a_merge_is_flattened() {
        // Property schemas collide and their allOf lists land in the merge result.
        let schema = json!({
            "allOf": [
                { "properties": { "tag": { "allOf": [{ "properties": { "k": { "type": "string" } } }] } } }
            ]
        });
        let merged = merge_all_of(&schema);
        assert_eq!(merged["properties"]["tag"]["properties"]["k"]["type"], "string");
        assert!(!has_composition(&merged));
    }

    #[test]
    fn merge_is_idempotent() {
        let schema = json!({
            "requestBody": { "content": { "application/json": { "schema": { "allOf": [
                { "required": ["id"], "properties": { "id": { "type": "integer" } } },
                { "properties": { "name": { "allOf": [{ "properties": { "first": {} } }] } } }
            ]}}}}
        });
        let once = merge_all_of(&schema);
        let twice = merge_all_of(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn non_object_branches_degrade_to_empty_object() {
        let schema = json!({ "allOf": [{ "type": "string" }, 42, "text"] });
        let merged = merge_all_of(&schema);
        assert_eq!(
            merged,
            json!({ "type": "object", "properties": {}, "required": [] })
        );
    }

    #[test]
    fn untouched_tree_passes_through() {
        let schema = json!({ "parameters": [{ "name": "q", "in": "query" }], "x": 1 });
        assert_eq!(merge_all_of(&schema), schema);
        assert!(!has_composition(&schema));
    }
}
