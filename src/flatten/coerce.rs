//! Scalar values and type coercion
//!
//! Coercion never fails. Absent inputs and type mismatches resolve to the
//! zero value of the target kind: `""`, `0`, `0.0`, `false`.

use crate::types::ScalarKind;
use serde_json::Value;
use std::fmt;

/// A typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Int64(i64),
    Float64(f64),
    Bool(bool),
}

impl Scalar {
    /// Zero value for a kind
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::String => Scalar::String(String::new()),
            ScalarKind::Int64 => Scalar::Int64(0),
            ScalarKind::Float64 => Scalar::Float64(0.0),
            ScalarKind::Bool => Scalar::Bool(false),
        }
    }

    /// Kind of this value
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::String(_) => ScalarKind::String,
            Scalar::Int64(_) => ScalarKind::Int64,
            Scalar::Float64(_) => ScalarKind::Float64,
            Scalar::Bool(_) => ScalarKind::Bool,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert to a JSON value (non-finite floats become `null`)
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::String(s) => Value::String(s.clone()),
            Scalar::Int64(v) => Value::from(*v),
            Scalar::Float64(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Scalar::Bool(v) => Value::Bool(*v),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => f.write_str(s),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
            Scalar::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Coerce a resolved JSON value into a scalar of the target kind
///
/// `None` and `null` both count as absent.
pub fn coerce(value: Option<&Value>, kind: ScalarKind) -> Scalar {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return Scalar::zero(kind);
    };

    match kind {
        ScalarKind::String => Scalar::String(match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
        ScalarKind::Int64 => Scalar::Int64(match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
                .unwrap_or(0),
            _ => 0,
        }),
        ScalarKind::Float64 => Scalar::Float64(match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            _ => 0.0,
        }),
        ScalarKind::Bool => Scalar::Bool(value.as_bool().unwrap_or(false)),
    }
}

/// Coerce a configured default value (always text) into the target kind
///
/// Unlike [`coerce`], which turns a JSON string into `0` for numeric kinds,
/// the text is parsed as the target kind, so `"42"` becomes `42` for
/// `int64`. Unparsable text yields the zero value.
pub fn coerce_default(text: &str, kind: ScalarKind) -> Scalar {
    let trimmed = text.trim();
    match kind {
        ScalarKind::String => Scalar::String(text.to_string()),
        ScalarKind::Int64 => Scalar::Int64(
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
                .unwrap_or(0),
        ),
        ScalarKind::Float64 => Scalar::Float64(trimmed.parse::<f64>().unwrap_or(0.0)),
        ScalarKind::Bool => Scalar::Bool(trimmed.parse::<bool>().unwrap_or(false)),
    }
}
