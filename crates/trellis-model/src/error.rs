//! Error types for the model crate.

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while manipulating or serializing the item tree.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A serialized document is malformed or incomplete.
    #[error("Malformed document: {message}")]
    Format { message: String },

    /// A document's declared model type disagrees with the target item.
    #[error("Model type mismatch: expected '{expected}', got '{got}'")]
    TypeMismatch { expected: String, got: String },

    /// The model type is not registered in the catalog.
    #[error("Unknown model type '{model_type}'")]
    UnknownType { model_type: String },

    /// A serialized data role is not part of the role table.
    #[error("Unknown data role {role}")]
    UnknownRole { role: u32 },

    /// The item id is invalid or the item has been removed.
    #[error("Invalid or removed item id")]
    InvalidItem,

    /// The named tag is not registered on the item.
    #[error("Unknown tag '{tag}'")]
    UnknownTag { tag: String },

    /// Inserting or removing would violate the tag's cardinality constraints.
    #[error("Cardinality violation on tag '{tag}': {message}")]
    Cardinality { tag: String, message: String },

    /// The row is out of bounds for the tag.
    #[error("Invalid row {row} for tag '{tag}'")]
    InvalidRow { tag: String, row: usize },

    /// The named property does not exist on the item.
    #[error("Unknown property '{name}'")]
    UnknownProperty { name: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O failed while reading or writing a document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ModelError {
    /// Create a format error.
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a type-mismatch error.
    pub fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Create a cardinality error.
    pub fn cardinality(tag: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cardinality {
            tag: tag.into(),
            message: message.into(),
        }
    }
}
