use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error on line {line}, field `{field}`: {reason}")]
    Validation {
        line: u64,
        field: &'static str,
        reason: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),
}

impl ImportError {
    pub fn validation(line: u64, field: &'static str, reason: impl Into<String>) -> Self {
        ImportError::Validation {
            line,
            field,
            reason: reason.into(),
        }
    }

    /// Short machine-readable name used in API error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ImportError::Schema(_) => "schema",
            ImportError::Parse(_) => "parse",
            ImportError::Validation { .. } => "validation",
            ImportError::Persistence(_) => "persistence",
        }
    }
}

impl From<csv::Error> for ImportError {
    fn from(e: csv::Error) -> Self {
        ImportError::Parse(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Conflict on product {product_id}: {message}")]
    Conflict { product_id: String, message: String },

    #[error("Corrupt record {product_id}: {message}")]
    Corrupt { product_id: String, message: String },
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read products: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to write report: {0}")]
    Write(#[from] csv::Error),
}
