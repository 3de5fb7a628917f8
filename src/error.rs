//! Error types for the schema generator

use crate::cache::TypeKey;
use crate::introspect::TypeId;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the generator
///
/// Generation errors abort the run that raised them; no partial schema is
/// ever returned. Federation violations are collected first and reported
/// together through [`Error::InvalidFederatedSchema`].
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced type lives outside every supported package
    #[error("type {type_id} is not supported, it is outside the supported packages {packages:?}")]
    TypeNotSupported {
        type_id: TypeId,
        packages: Vec<String>,
    },

    /// Two distinct types, or two variants of one type, map to the same GraphQL name
    #[error("cannot map {new} to GraphQL type {name}, the name is already used by {existing}")]
    ConflictingTypes {
        name: String,
        existing: TypeKey,
        new: TypeKey,
    },

    /// A union root has no concrete subtypes inside the supported packages
    #[error("union {type_id} has no concrete subtypes within the supported packages")]
    NoSubtypesFound { type_id: TypeId },

    /// Every federation violation found in the schema, one per line
    #[error("invalid federated schema:\n{}", .0.join("\n"))]
    InvalidFederatedSchema(Vec<String>),

    /// Abstract type used in an input position
    #[error("{type_id} cannot be used as an input type: {reason}")]
    InvalidInputType { type_id: TypeId, reason: String },

    /// None of the query roots contributed a field
    #[error("query type {0} does not define any fields")]
    EmptyQueryType(String),

    /// Introspection failures (unknown type, malformed shape)
    #[error("introspection error: {0}")]
    Introspection(String),

    /// GraphQL schema errors
    #[error("GraphQL schema error: {0}")]
    Schema(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::TypeNotSupported { .. } => "TYPE_NOT_SUPPORTED",
            Error::ConflictingTypes { .. } => "CONFLICTING_TYPES",
            Error::NoSubtypesFound { .. } => "NO_SUBTYPES_FOUND",
            Error::InvalidFederatedSchema(_) => "INVALID_FEDERATED_SCHEMA",
            Error::InvalidInputType { .. } => "INVALID_INPUT_TYPE",
            Error::EmptyQueryType(_) => "EMPTY_QUERY_TYPE",
            Error::Introspection(_) => "INTROSPECTION_ERROR",
            Error::Schema(_) => "SCHEMA_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Other(_) => "UNKNOWN_ERROR",
        }
    }

    /// Violations carried by an [`Error::InvalidFederatedSchema`], empty otherwise
    pub fn violations(&self) -> &[String] {
        match self {
            Error::InvalidFederatedSchema(violations) => violations,
            _ => &[],
        }
    }
}
