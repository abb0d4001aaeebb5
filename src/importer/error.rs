// ==========================================
// Sigorta CRM - import error types
// ==========================================
// File-level errors abort the whole request; row- and batch-level
// errors are collected into the summary instead.
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    // ===== file-level (fatal for the request) =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .csv/.txt/.xlsx)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("file contains no data rows")]
    EmptyFile,

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    // ===== header / layout =====
    #[error("header mismatch: expected {expected} columns, file has {actual}")]
    HeaderMismatch { expected: usize, actual: usize },

    // ===== row-level (collected, not thrown past the decoder) =====
    #[error("row {row} too short: {actual} columns, minimum {expected}")]
    RowTooShort {
        row: usize,
        expected: usize,
        actual: usize,
    },

    // ===== persistence =====
    #[error("database error: {0}")]
    DatabaseError(String),

    // ===== cancellation =====
    #[error("import cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

pub type ImportResult<T> = Result<T, ImportError>;
