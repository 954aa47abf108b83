//! In-memory tables and their CSV / spreadsheet persistence.

mod csv;
mod error;
mod spreadsheet;

use std::{fmt, fs, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::cell::Cell;

pub use error::{Result, TableError};

/// Storage format of a table file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    Csv,
    Spreadsheet,
}

impl TableFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("csv") => Ok(Self::Csv),
            Some("xlsx" | "xlsm" | "xls" | "ods") => Ok(Self::Spreadsheet),
            _ => Err(TableError::UnknownFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Reject output paths this format cannot be written to. Spreadsheets
    /// are always saved as `.xlsx`.
    pub fn check_output_path(self, path: &Path) -> Result<()> {
        let is_xlsx = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"));
        if self == Self::Spreadsheet && !is_xlsx {
            return Err(TableError::UnsupportedOutput {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "spreadsheet",
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "spreadsheet" | "xlsx" | "excel" => Ok(Self::Spreadsheet),
            other => Err(format!(
                "unknown table format `{other}` (expected csv or spreadsheet)"
            )),
        }
    }
}

/// Ordered rows under named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, Cell::Empty);
                }
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    /// Cells of one column in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> + '_ {
        self.rows.iter().map(move |row| &row[index])
    }

    /// Rename a column; returns `false` when `from` is absent.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Set `name` to `values`, replacing an existing column of that name or
    /// appending a new one.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold one entry per row.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        assert_eq!(values.len(), self.rows.len(), "one value per row");
        let index = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                self.headers.len() - 1
            }
        };
        for (row, value) in self.rows.iter_mut().zip(values) {
            let cell = Cell::from_field(&value);
            if index < row.len() {
                row[index] = cell;
            } else {
                row.resize(index, Cell::Empty);
                row.push(cell);
            }
        }
    }
}

/// Load a table from `path` in the given format.
pub fn read_table(path: &Path, format: TableFormat) -> Result<Table> {
    if !path.exists() {
        return Err(TableError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let table = match format {
        TableFormat::Csv => csv::read(path)?,
        TableFormat::Spreadsheet => spreadsheet::read(path)?,
    };
    debug!(
        path = %path.display(),
        rows = table.len(),
        columns = table.headers().len(),
        "loaded table"
    );
    Ok(table)
}

/// Persist a table to `path`, creating missing parent directories.
///
/// The table is staged in a temporary file beside `path` and moved into place
/// once fully written, so a failed write never leaves a partial file.
pub fn write_table(table: &Table, path: &Path, format: TableFormat) -> Result<()> {
    format.check_output_path(path)?;
    let io_err = |source: std::io::Error| TableError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent).map_err(io_err)?;
            parent
        }
        None => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir).map_err(io_err)?;
    match format {
        TableFormat::Csv => csv::write(table, &mut staged, path)?,
        TableFormat::Spreadsheet => spreadsheet::write(table, &mut staged, path)?,
    }
    staged.persist(path).map_err(|err| TableError::Persist {
        path: path.to_path_buf(),
        source: err.error,
    })?;
    debug!(path = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}
