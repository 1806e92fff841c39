use thiserror::Error;

/// Fatal problems encountered while reading a transaction file.
///
/// Loader functions return `anyhow::Result` so I/O failures carry context;
/// these variants are the typed causes callers can `downcast_ref` to.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("row {row}: '{value}' is not a DD/MM/YYYY date")]
    InvalidDate { row: usize, value: String },

    #[error("row {row}: '{value}' is not a valid {column}")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: column '{column}' has unsupported type {data_type}")]
    UnsupportedType {
        row: usize,
        column: &'static str,
        data_type: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("smoothing window must be between {min} and {max}, got {got}")]
    WindowOutOfRange { got: usize, min: usize, max: usize },
}
