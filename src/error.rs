use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Settings error: {0}")]
    Settings(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Input contains no observations")]
    EmptyInput,

    #[error("Required column '{0}' is missing from the input")]
    MissingColumn(String),

    #[error("Column length mismatch for '{column}': expected {expected} rows, got {actual}")]
    ColumnLength {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),
}

impl ProcessingError {
    /// True for errors caused by the shape of the input table rather than I/O.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ProcessingError::EmptyInput
                | ProcessingError::MissingColumn(_)
                | ProcessingError::ColumnLength { .. }
        )
    }
}
