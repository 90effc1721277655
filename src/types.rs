//! Common types used throughout json2parquet
//!
//! Column kinds, compression codecs and retry backoff strategies shared
//! by the loader, the writers and the fetch layer.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Scalar Kind
// ============================================================================

/// Target column type for a configured field
///
/// Unrecognized type names deserialize to [`ScalarKind::String`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum ScalarKind {
    #[default]
    String,
    Int64,
    Float64,
    Bool,
}

impl ScalarKind {
    /// Configuration name of this kind
    pub fn as_str(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Int64 => "int64",
            ScalarKind::Float64 => "float64",
            ScalarKind::Bool => "bool",
        }
    }

    /// Arrow type used to encode columns of this kind
    pub fn data_type(self) -> arrow::datatypes::DataType {
        use arrow::datatypes::DataType;
        match self {
            ScalarKind::String => DataType::Utf8,
            ScalarKind::Int64 => DataType::Int64,
            ScalarKind::Float64 => DataType::Float64,
            ScalarKind::Bool => DataType::Boolean,
        }
    }
}

impl From<&str> for ScalarKind {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "int64" => ScalarKind::Int64,
            "float64" => ScalarKind::Float64,
            "bool" => ScalarKind::Bool,
            _ => ScalarKind::String,
        }
    }
}

impl From<String> for ScalarKind {
    fn from(value: String) -> Self {
        ScalarKind::from(value.as_str())
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Compression
// ============================================================================

/// Compression codec for output files
///
/// Unrecognized codec names deserialize to [`CompressionCodec::None`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum CompressionCodec {
    Zstd,
    Snappy,
    Gzip,
    #[default]
    None,
}

impl CompressionCodec {
    /// Codec name, as used in configuration and rotated file names
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionCodec::Zstd => "zstd",
            CompressionCodec::Snappy => "snappy",
            CompressionCodec::Gzip => "gzip",
            CompressionCodec::None => "none",
        }
    }
}

impl From<&str> for CompressionCodec {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "zstd" => CompressionCodec::Zstd,
            "snappy" => CompressionCodec::Snappy,
            "gzip" => CompressionCodec::Gzip,
            _ => CompressionCodec::None,
        }
    }
}

impl From<String> for CompressionCodec {
    fn from(value: String) -> Self {
        CompressionCodec::from(value.as_str())
    }
}

impl From<CompressionCodec> for parquet::basic::Compression {
    fn from(codec: CompressionCodec) -> Self {
        use parquet::basic::{Compression, GzipLevel, ZstdLevel};
        match codec {
            CompressionCodec::Zstd => Compression::ZSTD(ZstdLevel::default()),
            CompressionCodec::Snappy => Compression::SNAPPY,
            CompressionCodec::Gzip => Compression::GZIP(GzipLevel::default()),
            CompressionCodec::None => Compression::UNCOMPRESSED,
        }
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}
