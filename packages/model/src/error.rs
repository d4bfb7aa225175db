use arbor_common::ModelError;
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures of anything that reads or writes models outside memory
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Document belongs to application '{found}', expected '{expected}'")]
    ApplicationMismatch { expected: String, found: String },

    #[error("Document holds a model of type '{found}', expected '{expected}'")]
    ModelTypeMismatch { expected: String, found: String },

    #[error("Document holds {found} models, expected {expected}")]
    ModelCountMismatch { expected: usize, found: usize },

    #[error("Malformed document: {0}")]
    Malformed(String),
}

impl StoreError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}
