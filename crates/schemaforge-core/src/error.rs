//! Error types for graph loading, registry lookups and render passes.

use thiserror::Error;

use crate::graph::TypeId;

/// The input type graph is malformed.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Type {from} references unknown type {target}")]
    DanglingReference { from: TypeId, target: TypeId },

    #[error("Enum '{name}' has no cases")]
    EmptyEnum { name: String },

    #[error("Union {id} has no members")]
    EmptyUnion { id: TypeId },

    #[error("Class '{name}' has an empty property name")]
    EmptyPropertyName { name: String },

    #[error("Type {id} declares {attribute} -> {target}, which is not a class")]
    NotAClass {
        id: TypeId,
        attribute: &'static str,
        target: TypeId,
    },
}

/// A schema registry lookup or registration failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Unresolved schema reference '{reference}': no artifact was registered for it")]
    Unresolved { reference: String },

    #[error("Schema reference '{reference}' is already registered as '{existing}'")]
    Duplicate { reference: String, existing: String },
}

/// A render pass failed. The whole pass output is discarded.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Missing required configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("{context}: {error}")]
    Reference {
        context: String,
        error: RegistryError,
    },

    #[error("Invalid entity glob: {pattern}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Name collision at {reference}: '{name}' is already declared")]
    NameCollision { reference: String, name: String },

    #[error("Schema error at {path}: {message}")]
    SchemaError { path: String, message: String },
}

impl RenderError {
    /// Wrap a registry failure with the schema fragment or symbol that needed it.
    pub fn reference(context: impl Into<String>, error: RegistryError) -> Self {
        RenderError::Reference {
            context: context.into(),
            error,
        }
    }
}
