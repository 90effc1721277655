//! YAML parser for flattening configurations
//!
//! Parses and validates configuration files.

use crate::error::{Error, Result};
use crate::loader::types::{ParseConfig, TableConfig};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_config(path: impl AsRef<Path>) -> Result<ParseConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_config_from_str(&content)
}

/// Load a configuration from a YAML string
pub fn load_config_from_str(yaml: &str) -> Result<ParseConfig> {
    let config: ParseConfig = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse config YAML: {e}")))?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate a configuration
///
/// `required` and `parquet_type` are deliberately not checked here.
pub fn validate_config(config: &ParseConfig) -> Result<()> {
    if config.output_path.as_os_str().is_empty() {
        return Err(Error::missing_field("output_path"));
    }

    if config.tables.is_empty() {
        return Err(Error::config("Config must define at least one table"));
    }

    let mut names = HashSet::new();
    for table in &config.tables {
        validate_table(table)?;
        if !names.insert(table.name.as_str()) {
            return Err(Error::config(format!(
                "Duplicate table name: {}",
                table.name
            )));
        }
    }

    if config.writer.batch_size == 0 {
        return Err(Error::invalid_value(
            "writer.batch_size",
            "must be greater than 0",
        ));
    }

    if config.writer.channel_capacity == 0 {
        return Err(Error::invalid_value(
            "writer.channel_capacity",
            "must be greater than 0",
        ));
    }

    Ok(())
}

/// Validate a table definition
fn validate_table(table: &TableConfig) -> Result<()> {
    if table.name.is_empty() {
        return Err(Error::config("Table name cannot be empty"));
    }

    let mut columns = HashSet::new();
    for field in table.effective_fields() {
        if field.name.is_empty() {
            return Err(Error::config(format!(
                "Table '{}' has a field with an empty name",
                table.name
            )));
        }
        if !columns.insert(field.name.as_str()) {
            return Err(Error::config(format!(
                "Table '{}' has duplicate column '{}'",
                table.name, field.name
            )));
        }
    }

    for parent_ref in &table.parent_refs {
        if parent_ref.entity_name.is_empty() {
            return Err(Error::config(format!(
                "Table '{}' has a parent_ref with an empty entity_name",
                table.name
            )));
        }
    }

    Ok(())
}
