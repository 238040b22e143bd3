//! Error types for document loading, compilation and call selection.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while reading a document into a value tree.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid YAML: {source}")]
    InvalidYaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("document root must be a mapping, got {actual}")]
    NotAMapping { actual: String },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during the one-time compilation of a document.
///
/// Any of these aborts the whole compilation; no partial catalog is produced.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unsupported reference \"{reference}\": only local fragments (#/...) are allowed")]
    UnsupportedReference { reference: String },

    #[error("reference \"{reference}\" does not point at anything in the document")]
    UnresolvedReference { reference: String },

    #[error("cyclic reference: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    #[error("malformed document at {path}: {message}")]
    MalformedDocument { path: String, message: String },
}

impl CompileError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }

    pub(crate) fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
        CompileError::MalformedDocument {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Errors from the bounded call-selection loop.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("no valid API call after {attempts} attempt(s); last proposal: {last:?}")]
    AttemptsExhausted { attempts: u32, last: String },
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Either stage of loading a document and compiling it.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

impl Error {
    /// Returns the exit code of the wrapped error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Load(e) => e.exit_code(),
            Error::Compile(e) => e.exit_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_exit_codes() {
        let err = LoadError::FileNotFound {
            path: PathBuf::from("openapi.yaml"),
        };
        assert_eq!(err.exit_code(), 3);

        let err = LoadError::NotAMapping {
            actual: "array".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn compile_error_exit_codes() {
        let err = CompileError::UnsupportedReference {
            reference: "other.yaml#/Pet".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert_eq!(Error::from(err).exit_code(), 2);
    }

    #[test]
    fn cyclic_reference_display() {
        let err = CompileError::CyclicReference {
            chain: vec!["#/components/schemas/A".into(), "#/components/schemas/A".into()],
        };
        assert_eq!(
            err.to_string(),
            "cyclic reference: #/components/schemas/A -> #/components/schemas/A"
        );
    }

    #[test]
    fn malformed_display() {
        let err = CompileError::malformed("/paths", "expected a mapping");
        assert_eq!(
            err.to_string(),
            "malformed document at /paths: expected a mapping"
        );
    }
}
