// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # json2parquet
//!
//! Config-driven flattening of nested JSON documents into relational
//! Parquet tables. One YAML file declares the tables, the dot-separated
//! path at which each table's rows live, the fields to copy, and which
//! ancestor records contribute parent-key columns. No per-dataset code.
//!
//! ## Features
//!
//! - **Nested tables**: arrays of objects at any depth become their own tables
//! - **Parent references**: ancestor fields are copied into child rows
//! - **Total coercion**: `string`, `int64`, `float64`, `bool` with fixed fallbacks
//! - **Rotating output**: sequentially numbered files by row count
//! - **Remote sources**: HTTP(S) with retry and `Retry-After`, S3, GCS, Azure
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use json2parquet::{load_config, FlattenEngine, Result};
//!
//! fn main() -> Result<()> {
//!     let config = load_config("parse_config.yaml")?;
//!     let stats = FlattenEngine::new(config).parse_file("input.json")?;
//!     println!("{} rows", stats.rows_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │            Pipeline: Download → Parse → Clean                    │
//! └──────────────────────────────────────────────────────────────────┘
//!        │                      │
//! ┌──────┴──────┐   ┌───────────┴──────────────────────────────────┐
//! │    Fetch    │   │               FlattenEngine                  │
//! ├─────────────┤   ├──────────────┬───────────────┬───────────────┤
//! │ Local copy  │   │  Traverser   │ flatten_record│   WriterSet   │
//! │ HTTP retry  │   │  Context     │ resolve       │ RotatingWriter│
//! │ S3/GCS/Azure│   │              │ coerce        │ ChannelWriter │
//! └─────────────┘   └──────────────┴───────────────┴───────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// YAML parse configuration
pub mod loader;

/// Path resolution, coercion, context binding, traversal
pub mod flatten;

/// Schema synthesis and Parquet writers
pub mod output;

/// Flattening orchestrator
pub mod engine;

/// Source download (local, HTTP, object stores)
pub mod fetch;

/// Download → Parse → Clean pipeline
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use engine::{FlattenEngine, RunStats};
pub use loader::{load_config, load_config_from_str, ParseConfig, TableConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
