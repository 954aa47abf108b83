//! Error types for reading and writing tables.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or persisting a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Input file does not exist.
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Extension does not map to a supported format.
    #[error("cannot infer table format from {path} (expected .csv, .xlsx, .xlsm, .xls or .ods)")]
    UnknownFormat { path: PathBuf },

    /// Failed to parse CSV input.
    #[error("failed to read CSV {path}: {source}")]
    CsvRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to write CSV output.
    #[error("failed to write CSV {path}: {source}")]
    CsvWrite {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Failed to open or parse a workbook.
    #[error("failed to read spreadsheet {path}: {message}")]
    SpreadsheetRead { path: PathBuf, message: String },

    /// Failed to save a workbook.
    #[error("failed to write spreadsheet {path}: {message}")]
    SpreadsheetWrite { path: PathBuf, message: String },

    /// A data row holds more fields than the header names.
    #[error("line {line} of {path} has {found} fields but the header has {expected}")]
    RowTooLong {
        path: PathBuf,
        line: u64,
        found: usize,
        expected: usize,
    },

    /// Spreadsheets are only written as `.xlsx`.
    #[error("spreadsheet output must use the .xlsx extension: {path}")]
    UnsupportedOutput { path: PathBuf },

    /// Input has no header row.
    #[error("table is empty: {path}")]
    Empty { path: PathBuf },

    /// Required column is absent.
    #[error("the expected column '{column}' was not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Filesystem error around the output file.
    #[error("failed to prepare output {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged output could not be moved into place.
    #[error("failed to write output {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, TableError>;
