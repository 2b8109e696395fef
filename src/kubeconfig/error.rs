use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to parse kubeconfig: {0}")]
    ParseFailure(String),

    #[error("Context '{0}' already exists")]
    AlreadyExists(String),

    #[error("Context '{context}' references missing {reference}")]
    MissingReference { context: String, reference: String },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot resolve kubeconfig location: {0}")]
    ResolutionError(String),

    #[error("Failed to serialize kubeconfig: {0}")]
    Serialization(String),
}

impl From<serde_yaml::Error> for ContextError {
    fn from(error: serde_yaml::Error) -> Self {
        ContextError::ParseFailure(error.to_string())
    }
}
