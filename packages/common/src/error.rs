use thiserror::Error;

/// Precondition violations raised by the item tree store.
///
/// None of these are recoverable runtime conditions: they signal a caller
/// asking for something the tree, pool or command stack cannot do. A failing
/// call leaves the tree exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Key already exists: {0}")]
    ExistingKey(String),

    #[error("Invalid insert: {0}")]
    InvalidInsert(String),

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Null argument: {0}")]
    NullArgument(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),
}

impl ModelError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn existing_key(message: impl Into<String>) -> Self {
        Self::ExistingKey(message.into())
    }

    pub fn invalid_insert(message: impl Into<String>) -> Self {
        Self::InvalidInsert(message.into())
    }

    pub fn invalid_move(message: impl Into<String>) -> Self {
        Self::InvalidMove(message.into())
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub fn null_argument(message: impl Into<String>) -> Self {
        Self::NullArgument(message.into())
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::NotImplemented(message.into())
    }
}
