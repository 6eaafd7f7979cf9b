//! Error taxonomy for schematic translation.
//!
//! Every variant aborts the current run; nothing here is retried.

use thiserror::Error;

use crate::params::ProcessParameterError;

#[derive(Debug, Error)]
pub enum CodeGenerationError {
    /// Missing or unparseable process parameters.
    #[error("configuration error: {0}")]
    Config(#[from] ProcessParameterError),

    /// Declared node/constraint types violate the required subtyping.
    #[error("schematic type incompatibility: {0}")]
    TypeHierarchy(String),

    /// A structural relationship in the schematic cannot be resolved.
    #[error("schematic topology error: {0}")]
    Topology(String),

    /// A computed value has no SMT-LIB2 literal.
    #[error("value {0} cannot be written as a real literal")]
    NonFiniteLiteral(f64),

    /// Cached strategy output requested before it exists.
    #[error("translation state error: {0}")]
    State(String),

    #[error("malformed schematic document: {0}")]
    SchematicFormat(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodeGenerationError {
    pub fn topology(message: impl Into<String>) -> Self {
        CodeGenerationError::Topology(message.into())
    }

    pub fn type_hierarchy(message: impl Into<String>) -> Self {
        CodeGenerationError::TypeHierarchy(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CodeGenerationError>;
