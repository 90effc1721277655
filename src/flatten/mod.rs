//! Flattening module
//!
//! Turns nested JSON documents into flat, typed rows.
//!
//! # Overview
//!
//! - `resolve` - Dot-separated path lookup over JSON objects
//! - `coerce` - Total conversion of JSON values into typed scalars
//! - `TraversalContext` - Immutable ancestor bindings for parent references
//! - `flatten_record` - Projects one JSON object (plus ancestors) into a row
//! - `Traverser` - Walks table paths through arrays and objects, emitting rows
//!
//! ```text
//! root record ──► Traverser ──► terminal array element ──► flatten_record ──► RowSink
//!                    ▲                    │
//!                    └── child context ◄──┘ (recurse for nested tables)
//! ```

mod coerce;
mod context;
mod path;
mod record;
mod traverse;

pub use coerce::{coerce, coerce_default, Scalar};
pub use context::{singularize, TraversalContext, CURRENT_KEY, USER_ALIAS};
pub use path::resolve;
pub use record::{flatten_record, FlatRecord};
pub use traverse::{RowSink, TraversalStats, Traverser};
