use thiserror::Error;

/// The input table does not fit the observation schema.
///
/// Raised at load time, before any filtering runs. The loader wraps these
/// in an [`anyhow::Error`]; callers that need to branch on the kind can
/// `downcast_ref::<SchemaError>()`.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingRequiredColumn(String),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

impl SchemaError {
    pub fn missing(column: &str) -> Self {
        SchemaError::MissingRequiredColumn(column.to_string())
    }

    pub fn invalid_row(row: usize, reason: impl Into<String>) -> Self {
        SchemaError::InvalidRow {
            row,
            reason: reason.into(),
        }
    }
}
