use crate::error::ModelError;

/// Result type used by every tree, pool and command operation
pub type ModelResult<T> = Result<T, ModelError>;
