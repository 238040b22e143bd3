//! Core types shared by the compilation pipeline and the catalog.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path-item keys that produce catalog operations, in canonical order.
pub const HTTP_METHODS: &[&str] = &["get", "post", "patch", "delete", "put"];

/// Key marking a reference node.
pub const REF_KEY: &str = "$ref";

/// Key marking a composition node.
pub const ALL_OF_KEY: &str = "allOf";

/// Returns the JSON type name for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build the identity key (`"METHOD PATH"`) naming one operation.
///
/// The method is uppercased and any `?query` suffix is stripped from the path.
pub fn identity_key(method: &str, path: &str) -> String {
    format!("{} {}", method.trim().to_uppercase(), strip_query(path.trim()))
}

/// Drop a `?query` suffix from a route.
pub fn strip_query(path: &str) -> &str {
    match path.find('?') {
        Some(idx) => &path[..idx],
        None => path,
    }
}

/// One reduced operation as it appears in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Identity key, e.g. `"GET /users/{id}"`.
    pub name: String,
    /// Operation description, or empty.
    #[serde(default)]
    pub description: String,
    /// Reduced operation document.
    pub docs: Value,
}

impl Endpoint {
    /// Create an endpoint for `method` + `path`, taking the description from `docs`.
    pub fn new(method: &str, path: &str, docs: Value) -> Self {
        let description = docs
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Self {
            name: identity_key(method, path),
            description,
            docs,
        }
    }
}

/// The compiled, catalog-ready projection of an OpenAPI document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReducedSpec {
    /// Top-level `servers` entries, verbatim.
    #[serde(default)]
    pub servers: Vec<Value>,
    /// API description, or empty.
    #[serde(default)]
    pub description: String,
    /// Reduced operations in document order.
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

/// Options for compiling a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReduceOptions {
    /// Inline local `$ref` pointers before reducing.
    pub dereference: bool,
    /// Flatten `allOf` compositions before reducing.
    pub merge_all_of: bool,
    /// Keep only parameters marked `required: true`.
    pub only_required: bool,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ReduceOptions {
    /// Full pipeline: dereference, merge compositions, keep required parameters only.
    pub fn new() -> Self {
        Self {
            dereference: true,
            merge_all_of: true,
            only_required: true,
        }
    }

    /// Set whether `$ref` pointers are inlined.
    pub fn dereference(mut self, dereference: bool) -> Self {
        self.dereference = dereference;
        self
    }

    /// Set whether `allOf` compositions are flattened.
    pub fn merge_all_of(mut self, merge_all_of: bool) -> Self {
        self.merge_all_of = merge_all_of;
        self
    }

    /// Set whether optional parameters are dropped.
    pub fn only_required(mut self, only_required: bool) -> Self {
        self.only_required = only_required;
        self
    }
}
