//! Record flattening
//!
//! Projects one JSON object, plus fields copied from bound ancestors, into a
//! flat row keyed by column name.

use super::coerce::{coerce, coerce_default, Scalar};
use super::context::TraversalContext;
use super::path::resolve;
use crate::loader::TableConfig;
use crate::types::ScalarKind;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::trace;

/// One output row: column name to coerced value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    values: HashMap<String, Scalar>,
}

impl FlatRecord {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: HashMap::with_capacity(capacity),
        }
    }

    /// Set a column, replacing any earlier value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Scalar) {
        self.values.insert(name.into(), value);
    }

    /// Value of a column
    pub fn get(&self, name: &str) -> Option<&Scalar> {
        self.values.get(name)
    }

    /// Value of a column as `kind`, or the zero value when missing or mistyped
    pub fn value_or_zero(&self, name: &str, kind: ScalarKind) -> Scalar {
        match self.values.get(name) {
            Some(value) if value.kind() == kind => value.clone(),
            _ => Scalar::zero(kind),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Scalar)> {
        self.values.iter()
    }

    /// Row as a JSON object
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, Scalar)> for FlatRecord {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Flatten one record for `table`
///
/// Parent-ref fields are resolved against the ancestors bound in `ctx`; an
/// unbound ancestor contributes nothing. Own fields are resolved against
/// `record`, with `default_value` substituted only when the path is absent.
/// Own fields are written last, so they win on a name collision.
pub fn flatten_record(table: &TableConfig, record: &Value, ctx: &TraversalContext<'_>) -> FlatRecord {
    let mut row = FlatRecord::with_capacity(table.column_count());

    for parent_ref in &table.parent_refs {
        let Some(parent) = ctx.parent(&parent_ref.entity_name) else {
            trace!(
                "Table {}: no ancestor bound for '{}'",
                table.name,
                parent_ref.entity_name
            );
            continue;
        };

        for field in &parent_ref.fields {
            let value = resolve(parent, &field.json_path);
            row.insert(field.name.clone(), coerce(value, field.field_type));
        }
    }

    for field in &table.fields {
        let value = match resolve(record, &field.json_path) {
            None if !field.default_value.is_empty() => {
                coerce_default(&field.default_value, field.field_type)
            }
            resolved => coerce(resolved, field.field_type),
        };
        row.insert(field.name.clone(), value);
    }

    row
}
