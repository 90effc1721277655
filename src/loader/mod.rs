//! YAML Loader module
//!
//! Parse flattening configurations from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `ParseConfig` - Declarative description of source, tables and output
//! - `TableConfig` / `FieldConfig` / `ParentRef` - Table and column mappings
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_config, load_config_from_str, validate_config};
pub use types::{
    FetchDefinition, FieldConfig, ParentRef, ParseConfig, SourceConfig, TableConfig,
    WriterDefinition,
};
