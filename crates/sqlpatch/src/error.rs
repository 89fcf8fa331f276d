//! Error types for sqlpatch

use thiserror::Error;

/// Boxed error returned by user-supplied conversions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type alias for sqlpatch operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for clause building and template rendering.
///
/// Every variant is terminal for the call that produced it: builders never
/// return partial output alongside an error.
#[derive(Debug, Error)]
pub enum OrmError {
    /// A field accessor could not read the value for a column
    #[error("Field access error on column '{column}': {message}")]
    FieldAccess { column: String, message: String },

    /// An embedded reference resolved to a table without exactly one primary key
    #[error("Not supported multiple primary keys: table '{table}' has {count} primary key columns")]
    CompositeKey { table: String, count: usize },

    /// Structured-data codec failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A custom `ToDb` conversion failed
    #[error(transparent)]
    Conversion(BoxError),

    /// Template registry / rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl OrmError {
    /// Create a field access error for a specific column
    pub fn field_access(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FieldAccess {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is a field access error
    pub fn is_field_access(&self) -> bool {
        matches!(self, Self::FieldAccess { .. })
    }

    /// Check if this is a composite key error
    pub fn is_composite_key(&self) -> bool {
        matches!(self, Self::CompositeKey { .. })
    }
}
