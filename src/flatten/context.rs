//! Ancestor bindings for parent references
//!
//! A context is never mutated in place. Binding returns a new context, so
//! sibling branches built from the same parent never see each other's
//! bindings. Records are borrowed from the document, so a clone only copies
//! references.

use serde_json::Value;
use std::collections::HashMap;

/// Reserved key holding the record the current table traversal started from
pub const CURRENT_KEY: &str = "__current__";

/// Parent-ref entity name that always reads the enclosing record
pub const USER_ALIAS: &str = "user";

/// Entity name to ancestor record bindings
#[derive(Debug, Clone, Default)]
pub struct TraversalContext<'a> {
    bindings: HashMap<String, &'a Value>,
}

impl<'a> TraversalContext<'a> {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this context with `record` as the enclosing record
    #[must_use]
    pub fn with_current(&self, record: &'a Value) -> Self {
        let mut next = self.clone();
        next.bindings.insert(CURRENT_KEY.to_string(), record);
        next
    }

    /// Copy of this context with `record` bound under `name` and its naive singular
    #[must_use]
    pub fn with_entity(&self, name: &str, record: &'a Value) -> Self {
        let mut next = self.clone();
        next.bindings.insert(name.to_string(), record);
        let singular = singularize(name);
        if singular != name {
            next.bindings.insert(singular.to_string(), record);
        }
        next
    }

    /// Record bound under `name`
    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.bindings.get(name).copied()
    }

    /// The enclosing record
    pub fn current(&self) -> Option<&'a Value> {
        self.get(CURRENT_KEY)
    }

    /// Ancestor record for a parent reference, honoring the `user` alias
    pub fn parent(&self, entity_name: &str) -> Option<&'a Value> {
        if entity_name == USER_ALIAS {
            self.current()
        } else {
            self.get(entity_name)
        }
    }

    /// Whether `name` is bound
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Number of bound keys, including the reserved current key
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Strip one trailing `s` from names longer than one byte
///
/// Intentionally not linguistic: `"status"` becomes `"statu"`.
pub fn singularize(name: &str) -> &str {
    match name.strip_suffix('s') {
        Some(stem) if name.len() > 1 => stem,
        _ => name,
    }
}
