//! Document loading from files, strings, and HTTP URLs.
//!
//! OpenAPI documents arrive as YAML or JSON. Both are read into the same
//! `serde_json::Value` tree so the rest of the pipeline works on one
//! representation.

use std::path::Path;

use serde_json::{Map, Number, Value};

use crate::error::LoadError;
use crate::types::json_type_name;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load a document from a file path.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist, or a parse
/// error if the content is neither valid JSON nor valid YAML.
pub fn load_document(path: &Path) -> Result<Value, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded document file");
    load_document_str(&content)
}

/// Load a document from YAML or JSON text.
///
/// Text whose first non-blank character is `{` is parsed as JSON, anything
/// else as YAML. The root must be a mapping.
///
/// # Errors
///
/// Returns `LoadError::InvalidJson`/`InvalidYaml` on syntax errors and
/// `LoadError::NotAMapping` when the root is a scalar or sequence.
pub fn load_document_str(content: &str) -> Result<Value, LoadError> {
    let document = if content.trim_start().starts_with('{') {
        serde_json::from_str(content).map_err(|source| LoadError::InvalidJson { source })?
    } else {
        let mut yaml: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|source| LoadError::InvalidYaml { source })?;
        yaml.apply_merge()
            .map_err(|source| LoadError::InvalidYaml { source })?;
        yaml_to_json(&yaml)?
    };

    if !document.is_object() {
        return Err(LoadError::NotAMapping {
            actual: json_type_name(&document).to_string(),
        });
    }
    Ok(document)
}

/// Load a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails, or a parse error
/// if the body isn't a valid document.
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<Value, LoadError> {
    let network_error = |source: reqwest::Error| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client.get(url).send().map_err(network_error)?;

    // Check for HTTP errors before parsing
    let response = response.error_for_status().map_err(network_error)?;
    let body = response.text().map_err(network_error)?;

    tracing::debug!(url, bytes = body.len(), "fetched document");
    load_document_str(&body)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn load_document_auto(source: &str) -> Result<Value, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

/// Convert a YAML tree into a JSON tree.
///
/// YAML allows non-string mapping keys (`200:` under `responses` is the
/// usual case); those are rendered to their scalar text.
fn yaml_to_json(value: &serde_yaml::Value) -> Result<Value, LoadError> {
    use serde_yaml::Value as Yaml;

    Ok(match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => yaml_number(n),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => {
            Value::Array(seq.iter().map(yaml_to_json).collect::<Result<_, _>>()?)
        }
        Yaml::Mapping(map) => {
            let mut out = Map::new();
            for (k, v) in map {
                out.insert(yaml_key(k)?, yaml_to_json(v)?);
            }
            Value::Object(out)
        }
        Yaml::Tagged(tagged) => yaml_to_json(&tagged.value)?,
    })
}

fn yaml_number(n: &serde_yaml::Number) -> Value {
    if let Some(i) = n.as_i64() {
        Value::Number(i.into())
    } else if let Some(u) = n.as_u64() {
        Value::Number(u.into())
    } else {
        // NaN and infinities have no JSON form
        n.as_f64()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

fn yaml_key(key: &serde_yaml::Value) -> Result<String, LoadError> {
    use serde_yaml::Value as Yaml;

    Ok(match key {
        Yaml::String(s) => s.clone(),
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        Yaml::Tagged(tagged) => yaml_key(&tagged.value)?,
        complex => serde_yaml::to_string(complex)
            .map_err(|source| LoadError::InvalidYaml { source })?
            .trim_end()
            .to_string(),
    })
}
