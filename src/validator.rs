//! Call validation against an endpoint catalog.
//!
//! A reasoning agent proposes calls as free text:
//!
//! ```text
//! API calling 1: GET /search/person to search for Wong Kar-Wai
//! ```
//!
//! The call line is extracted and looked up in the catalog. Anything that
//! does not match is simply invalid; nothing here returns an error for bad
//! input.

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::EndpointCatalog;
use crate::error::ValidateError;
use crate::types::identity_key;

/// Text appended to a rejected proposal before asking again.
pub const INVALID_API_FEEDBACK: &str = "Invalid API. Please try again.";

fn call_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"API calling \d+: (.*)").expect("valid call-line regex"))
}

fn plan_endpoint_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(GET|POST|PATCH|DELETE|PUT)\s+(/\S*)").expect("valid plan endpoint regex")
    })
}

/// Extract the call from the first `API calling N: ...` line.
///
/// Returns `""` when there is no such line.
pub fn extract_call(text: &str) -> &str {
    call_line_pattern()
        .captures(text)
        .and_then(|c| c.get(1))
        .map_or("", |m| m.as_str())
}

/// Returns true if `text` proposes a call the catalog knows.
pub fn is_valid_call(catalog: &EndpointCatalog, text: &str) -> bool {
    let call = extract_call(text);
    let valid = catalog.get_operation(call).is_some();
    tracing::debug!(call, valid, "validated proposed call");
    valid
}

/// Identity keys of every catalog endpoint mentioned in a plan, in order of
/// appearance.
///
/// Mentions look like `GET /movie/popular`; query suffixes are ignored and
/// mentions unknown to the catalog are dropped.
pub fn matched_endpoints(catalog: &EndpointCatalog, plan: &str) -> Vec<String> {
    plan_endpoint_pattern()
        .captures_iter(plan)
        .map(|c| identity_key(&c[1], &c[2]))
        .filter(|key| catalog.contains(key))
        .collect()
}

/// Bound on the propose-validate-retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of proposals requested. Zero is treated as one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5 }
    }
}

impl RetryPolicy {
    /// Create a policy allowing `max_attempts` proposals.
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }
}

/// A proposal that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSelection {
    /// The extracted call, e.g. `"GET /users to list users"`.
    pub call: String,
    /// The full proposal text.
    pub output: String,
    /// Number of proposals it took, starting at 1.
    pub attempts: u32,
}

/// Ask `propose` for calls until one is valid or the policy runs out.
///
/// `propose` receives the attempt number (starting at 1) and, on retries,
/// the previous proposal followed by [`INVALID_API_FEEDBACK`].
///
/// # Errors
///
/// Returns `ValidateError::AttemptsExhausted` with the last proposal when no
/// attempt produced a valid call.
pub fn select_valid_call<F>(
    catalog: &EndpointCatalog,
    policy: &RetryPolicy,
    mut propose: F,
) -> Result<CallSelection, ValidateError>
where
    F: FnMut(u32, Option<&str>) -> String,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut feedback: Option<String> = None;
    let mut last = String::new();

    for attempt in 1..=max_attempts {
        let output = propose(attempt, feedback.as_deref());
        if is_valid_call(catalog, &output) {
            return Ok(CallSelection {
                call: extract_call(&output).to_string(),
                output,
                attempts: attempt,
            });
        }
        tracing::warn!(attempt, max_attempts, "proposed call is not in the catalog");
        feedback = Some(format!("{}\n{}", output, INVALID_API_FEEDBACK));
        last = output;
    }

    Err(ValidateError::AttemptsExhausted {
        attempts: max_attempts,
        last,
    })
}
