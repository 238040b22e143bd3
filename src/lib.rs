//! OpenAPI endpoint catalogs
//!
//! Compiles a raw OpenAPI/Swagger document into a minimal per-operation
//! catalog that can be shown to a reasoning agent and used to validate the
//! calls it proposes.
//!
//! # Example
//!
//! ```
//! use oas_catalog::{compile_str, is_valid_call, EndpointCatalog, ReduceOptions};
//!
//! let yaml = r#"
//! paths:
//!   /users:
//!     get:
//!       parameters:
//!         - $ref: '#/components/parameters/userIdParam'
//! components:
//!   parameters:
//!     userIdParam:
//!       name: user_id
//!       in: query
//!       required: true
//!       schema:
//!         type: integer
//! "#;
//!
//! let spec = compile_str(yaml, &ReduceOptions::new()).unwrap();
//! let catalog = EndpointCatalog::from(spec);
//!
//! let docs = catalog.get_operation("GET /users").unwrap();
//! assert_eq!(docs["parameters"][0]["name"], "user_id");
//! assert!(is_valid_call(&catalog, "API calling 1: GET /users to find the user"));
//! ```
//!
//! # Pipeline
//!
//! | Stage | Function | Effect |
//! |-------|----------|--------|
//! | resolve | [`resolve`] | inline `#/...` references, reject cycles |
//! | compose | [`merge_all_of`] | fold `allOf` into one object schema |
//! | reduce | [`reduce_operation`] | keep description, parameters, requestBody; empty responses |
//! | index | [`EndpointCatalog`] | `"METHOD PATH"` lookup, listing, add/remove |
//!
//! [`reduce_document`] runs the first three stages over every operation.

mod catalog;
mod compose;
mod error;
mod loader;
mod reducer;
mod resolver;
mod types;
mod validator;

pub use catalog::{parse_identity, EndpointCatalog};
pub use compose::{has_composition, merge_all_of};
pub use error::{CompileError, Error, LoadError, ValidateError};
pub use loader::{is_url, load_document, load_document_auto, load_document_str};
pub use reducer::{
    compile_file, compile_str, reduce_document, reduce_operation, reduce_parameters,
};
pub use resolver::{navigate_fragment, resolve};
pub use types::{
    identity_key, json_type_name, strip_query, Endpoint, ReduceOptions, ReducedSpec,
    HTTP_METHODS,
};
pub use validator::{
    extract_call, is_valid_call, matched_endpoints, select_valid_call, CallSelection,
    RetryPolicy, INVALID_API_FEEDBACK,
};

#[cfg(feature = "remote")]
pub use loader::load_document_url;
