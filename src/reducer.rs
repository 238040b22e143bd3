//! Operation reduction and the one-time document compilation.

use std::path::Path;

use serde_json::{Map, Value};

use crate::compose::merge_all_of;
use crate::error::{CompileError, Error};
use crate::loader::{load_document, load_document_str};
use crate::resolver::resolve;
use crate::types::{json_type_name, Endpoint, ReduceOptions, ReducedSpec, HTTP_METHODS};

/// Strip an operation down to what an agent needs to pick and fill a call.
///
/// The output holds at most `description`, `parameters`, `requestBody` and
/// `responses`, each only when the input has it. `responses` is always
/// collapsed to `{}`: response shapes are not available to catalog
/// consumers.
///
/// # Errors
///
/// Returns `MalformedDocument` if `operation` is not a mapping or its
/// `parameters` is not a list.
pub fn reduce_operation(operation: &Value, only_required: bool) -> Result<Value, CompileError> {
    reduce_operation_at(operation, only_required, "")
}

/// Filter a parameter list.
///
/// With `only_required`, keeps parameters whose `required` is `true`; a
/// missing `required` counts as `false`. Otherwise returns the list as-is.
pub fn reduce_parameters(parameters: &[Value], only_required: bool) -> Vec<Value> {
    parameters
        .iter()
        .filter(|p| !only_required || is_required(p))
        .cloned()
        .collect()
}

/// Compile a parsed OpenAPI document into a [`ReducedSpec`].
///
/// Every `get`/`post`/`patch`/`delete`/`put` operation under `paths` becomes
/// one endpoint, in document order. Depending on `options` the operation
/// documents are dereferenced and have their compositions flattened before
/// being reduced.
///
/// # Errors
///
/// Any failure aborts the whole compilation; `paths` must exist and be a
/// mapping of mappings.
pub fn reduce_document(
    document: &Value,
    options: &ReduceOptions,
) -> Result<ReducedSpec, CompileError> {
    let paths = match document.get("paths") {
        Some(Value::Object(paths)) => paths,
        Some(other) => {
            return Err(CompileError::malformed(
                "/paths",
                format!("expected mapping, got {}", json_type_name(other)),
            ))
        }
        None => return Err(CompileError::malformed("/", "missing \"paths\"")),
    };

    let mut endpoints = Vec::new();
    for (route, item) in paths {
        let item_path = format!("/paths/{}", escape_pointer(route));
        let Value::Object(item) = item else {
            return Err(CompileError::malformed(
                item_path,
                format!("expected path item mapping, got {}", json_type_name(item)),
            ));
        };

        for (method, operation) in item {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let op_path = format!("{}/{}", item_path, method);
            let docs = compile_operation(operation, document, options, &op_path)?;
            let endpoint = Endpoint::new(method, route, docs);
            tracing::debug!(endpoint = %endpoint.name, "compiled operation");
            endpoints.push(endpoint);
        }
    }

    let servers = match document.get("servers") {
        Some(Value::Array(servers)) => servers.clone(),
        _ => Vec::new(),
    };
    let description = document
        .get("description")
        .and_then(Value::as_str)
        .or_else(|| document.pointer("/info/description").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    tracing::info!(endpoints = endpoints.len(), "compiled document");
    Ok(ReducedSpec {
        servers,
        description,
        endpoints,
    })
}

/// Load YAML/JSON text and compile it.
pub fn compile_str(content: &str, options: &ReduceOptions) -> Result<ReducedSpec, Error> {
    let document = load_document_str(content)?;
    Ok(reduce_document(&document, options)?)
}

/// Load a document file and compile it.
pub fn compile_file(path: &Path, options: &ReduceOptions) -> Result<ReducedSpec, Error> {
    let document = load_document(path)?;
    Ok(reduce_document(&document, options)?)
}

// --- Internal implementation ---

fn compile_operation(
    operation: &Value,
    document: &Value,
    options: &ReduceOptions,
    path: &str,
) -> Result<Value, CompileError> {
    let mut docs = operation.clone();
    if options.dereference {
        docs = resolve(&docs, document).map_err(|e| locate(e, path))?;
    }
    if options.merge_all_of {
        docs = merge_all_of(&docs);
    }
    reduce_operation_at(&docs, options.only_required, path)
}

/// Prefix a node-relative malformed path with the operation location.
fn locate(err: CompileError, at: &str) -> CompileError {
    match err {
        CompileError::MalformedDocument { path, message } => CompileError::MalformedDocument {
            path: format!("{}{}", at, path),
            message,
        },
        other => other,
    }
}

fn reduce_operation_at(
    operation: &Value,
    only_required: bool,
    path: &str,
) -> Result<Value, CompileError> {
    let Value::Object(docs) = operation else {
        return Err(CompileError::malformed(
            path,
            format!("expected operation mapping, got {}", json_type_name(operation)),
        ));
    };

    let mut out = Map::new();

    if let Some(description) = docs.get("description") {
        out.insert("description".to_string(), description.clone());
    }

    if let Some(parameters) = docs.get("parameters") {
        let Value::Array(parameters) = parameters else {
            return Err(CompileError::malformed(
                format!("{}/parameters", path),
                format!("expected list, got {}", json_type_name(parameters)),
            ));
        };
        out.insert(
            "parameters".to_string(),
            Value::Array(reduce_parameters(parameters, only_required)),
        );
    }

    if let Some(body) = docs.get("requestBody") {
        out.insert("requestBody".to_string(), body.clone());
    }

    if docs.contains_key("responses") {
        out.insert("responses".to_string(), Value::Object(Map::new()));
    }

    Ok(Value::Object(out))
}

/// JSON Pointer encoding of one segment (`~` = `~0`, `/` = `~1`).
fn escape_pointer(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

fn is_required(parameter: &Value) -> bool {
    parameter
        .get("required")
        .and_then(Value::as_bool)
        .unwrap_or(false)
}
