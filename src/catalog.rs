//! Indexed endpoint catalog built from a compiled OpenAPI document.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::types::{identity_key, strip_query, Endpoint, ReducedSpec};

/// Reduced operations keyed by identity (`"METHOD PATH"`).
///
/// Lookups are hash-indexed. The catalog is shared by reference between
/// threads: lookups take a read lock, `add_endpoint`/`remove_endpoint`
/// take the write lock, so a reader never sees a half-applied mutation.
#[derive(Debug, Default)]
pub struct EndpointCatalog {
    index: RwLock<Index>,
}

#[derive(Debug, Default)]
struct Index {
    endpoints: Vec<Endpoint>,
    positions: HashMap<String, usize>,
}

impl Index {
    /// Insert or replace in place; returns the replaced endpoint.
    fn insert(&mut self, endpoint: Endpoint) -> Option<Endpoint> {
        match self.positions.get(&endpoint.name) {
            Some(&i) => Some(std::mem::replace(&mut self.endpoints[i], endpoint)),
            None => {
                self.positions
                    .insert(endpoint.name.clone(), self.endpoints.len());
                self.endpoints.push(endpoint);
                None
            }
        }
    }

    fn remove(&mut self, key: &str) -> Option<Endpoint> {
        let i = self.positions.remove(key)?;
        let removed = self.endpoints.remove(i);
        for pos in self.positions.values_mut() {
            if *pos > i {
                *pos -= 1;
            }
        }
        Some(removed)
    }

    fn get(&self, key: &str) -> Option<&Endpoint> {
        self.positions.get(key).map(|&i| &self.endpoints[i])
    }
}

/// Parse free identity text into a catalog key.
///
/// The text is split on the first run of whitespace into method and
/// remainder. The path is the first token of the remainder, so trailing
/// prose (`"GET /users to list users"`) is ignored; a `?query` suffix is
/// dropped and the method is uppercased. Returns `None` if either part is
/// missing.
///
/// Paths are not template-aware: `"GET /users/42"` does not name
/// `"GET /users/{id}"`.
pub fn parse_identity(text: &str) -> Option<String> {
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let method = parts.next().filter(|m| !m.is_empty())?;
    let path = parts.next()?.split_whitespace().next()?;
    let path = strip_query(path);
    if path.is_empty() {
        return None;
    }
    Some(identity_key(method, path))
}

impl EndpointCatalog {
    /// Build a catalog from endpoints in insertion order.
    ///
    /// A repeated identity replaces the earlier endpoint's docs in place.
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        let mut index = Index::default();
        for endpoint in endpoints {
            if let Some(previous) = index.insert(endpoint) {
                tracing::warn!(endpoint = %previous.name, "duplicate endpoint replaced");
            }
        }
        Self {
            index: RwLock::new(index),
        }
    }

    /// Build a catalog from a compiled OpenAPI document.
    pub fn from_spec(spec: &ReducedSpec) -> Self {
        Self::new(spec.endpoints.iter().cloned())
    }

    /// Look up the reduced docs for identity text like `"GET /users/{id}"`.
    ///
    /// Returns `None` for unknown or malformed text; a miss is not an error.
    pub fn get_operation(&self, identity: &str) -> Option<Value> {
        self.get_endpoint(identity).map(|e| e.docs)
    }

    /// Look up the full endpoint entry for identity text.
    pub fn get_endpoint(&self, identity: &str) -> Option<Endpoint> {
        let key = parse_identity(identity)?;
        let found = self.read().get(&key).cloned();
        tracing::debug!(key = %key, found = found.is_some(), "catalog lookup");
        found
    }

    /// Returns true if identity text names a catalog endpoint.
    pub fn contains(&self, identity: &str) -> bool {
        parse_identity(identity).is_some_and(|key| self.read().positions.contains_key(&key))
    }

    /// Identity keys in insertion order.
    ///
    /// Each call returns a fresh snapshot.
    pub fn list_endpoints(&self) -> Vec<String> {
        self.read().endpoints.iter().map(|e| e.name.clone()).collect()
    }

    /// Snapshot of all endpoints in insertion order.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.read().endpoints.clone()
    }

    /// Register an endpoint, replacing any existing one with the same identity.
    ///
    /// Returns the replaced endpoint, if any.
    pub fn add_endpoint(&self, path: &str, method: &str, docs: Value) -> Option<Endpoint> {
        let endpoint = Endpoint::new(method, path, docs);
        tracing::debug!(endpoint = %endpoint.name, "adding endpoint");
        self.write().insert(endpoint)
    }

    /// Retract an endpoint. Returns whether it was present.
    pub fn remove_endpoint(&self, path: &str, method: &str) -> bool {
        let key = identity_key(method, path);
        let removed = self.write().remove(&key).is_some();
        tracing::debug!(key = %key, removed, "removing endpoint");
        removed
    }

    /// Number of endpoints.
    pub fn len(&self) -> usize {
        self.read().endpoints.len()
    }

    /// Returns true if the catalog has no endpoints.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render one `"<name> <docs-json>"` line per endpoint, for prompt text.
    pub fn render_docs(&self) -> String {
        self.read()
            .endpoints
            .iter()
            .map(|e| format!("{} {}", e.name, e.docs))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // Mutations never leave the index half-updated, so a poisoned lock
    // still guards a consistent value.
    fn read(&self) -> RwLockReadGuard<'_, Index> {
        self.index.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Index> {
        self.index.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<ReducedSpec> for EndpointCatalog {
    fn from(spec: ReducedSpec) -> Self {
        Self::new(spec.endpoints)
    }
}

impl Clone for EndpointCatalog {
    fn clone(&self) -> Self {
        Self::new(self.endpoints())
    }
}
