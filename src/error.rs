//! Error types for schema generation, catalog loading and validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors during schema generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("cannot inline all schemas: {type_name} refers to itself")]
    CircularInline { type_name: String },

    #[error("schema node contains itself after reference resolution")]
    CircularNode,

    #[error("unknown type: {name}")]
    UnknownType { name: String },

    #[error("invalid type expression \"{expression}\": {message}")]
    InvalidTypeExpression { expression: String, message: String },

    #[error("definition naming produced duplicate keys: {}", names.join(", "))]
    DuplicateDefinitionNames { names: Vec<String> },

    /// Failure raised by caller-supplied extension code, passed through unchanged.
    #[error(transparent)]
    Provider(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Errors while loading a type catalog or settings file.
#[derive(Debug, Error)]
pub enum CatalogError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML: {source}")]
    InvalidToml {
        #[source]
        source: toml::de::Error,
    },

    // Catalog consistency errors (exit code 2)
    #[error("type declared twice: {name}")]
    DuplicateType { name: String },

    #[error("{context} refers to unknown type {name}")]
    UnknownType { context: String, name: String },
}

impl CatalogError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CatalogError::FileNotFound { .. } | CatalogError::ReadError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error("invalid schema: {message}")]
    InvalidSchema { message: String },

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid value.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Catalog(e) => e.exit_code(),
            ValidateError::Generate(e) => e.exit_code(),
            ValidateError::InvalidSchema { .. } => 2,
            ValidateError::Invalid { .. } => 1,
        }
    }
}
