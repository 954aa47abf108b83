use std::{io::Write, path::Path};

use super::error::{Result, TableError};
use super::Table;
use crate::cell::Cell;

/// Read a CSV file with a header row. Short rows are padded with empty cells;
/// rows wider than the header are rejected.
pub(super) fn read(path: &Path) -> Result<Table> {
    let csv_err = |source| TableError::CsvRead {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(csv_err)?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(TableError::Empty {
            path: path.to_path_buf(),
        });
    }

    let width = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        if record.len() > width {
            return Err(TableError::RowTooLong {
                path: path.to_path_buf(),
                line: record.position().map_or(0, |pos| pos.line()),
                found: record.len(),
                expected: width,
            });
        }
        rows.push(record.iter().map(Cell::from_field).collect());
    }
    Ok(Table::new(headers, rows))
}

/// Serialize `table` into `out`; `path` only labels errors.
pub(super) fn write<W: Write>(table: &Table, out: W, path: &Path) -> Result<()> {
    let csv_err = |source| TableError::CsvWrite {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.headers()).map_err(csv_err)?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(Cell::to_string))
            .map_err(csv_err)?;
    }
    writer.flush().map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
