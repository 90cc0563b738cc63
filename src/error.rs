//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// Failure while substituting parameters into a raw expression.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No value for placeholder {{:{0}}}")]
    UnresolvedPlaceholder(String),

    #[error("Cannot render non-finite number {0}")]
    NonFinite(f64),

    #[error("Datetime formatting error: {0}")]
    DateFormat(#[from] time::error::Format),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A field path rejected by a [`Schema`](crate::schema::Schema).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("Unknown field '{segment}' in path '{path}'")]
    UnknownField { path: String, segment: String },

    #[error("Path '{path}' has depth {depth}, maximum is {max}")]
    TooDeep {
        path: String,
        depth: usize,
        max: usize,
    },

    #[error("Path '{0}' contains an empty segment")]
    EmptySegment(String),

    #[error("Field '{segment}' in path '{path}' cannot be traversed")]
    NotTraversable { path: String, segment: String },

    #[error("Relation field '{0}' does not name a target collection")]
    MissingRelationTarget(String),
}

/// Failure while loading or compiling a query or schema file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ::config::ConfigError,
    },

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Operator '{op}' on '{field}' requires {expected}")]
    Arity {
        op: String,
        field: String,
        expected: &'static str,
    },

    #[error("Invalid datetime '{value}': {source}")]
    DateTime {
        value: String,
        #[source]
        source: time::error::Parse,
    },

    #[error("Expected a string for a datetime value, got {0}")]
    DateTimeType(serde_json::Value),

    #[error("Filter groups must contain at least one expression")]
    EmptyGroup,

    #[error("A schema was given but the query names no collection")]
    MissingCollection,

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
