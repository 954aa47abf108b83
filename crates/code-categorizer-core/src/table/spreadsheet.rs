use std::{io::Write, path::Path};

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook;

use super::error::{Result, TableError};
use super::Table;
use crate::cell::Cell;

/// Read the first worksheet; its first row holds the column names.
pub(super) fn read(path: &Path) -> Result<Table> {
    let read_err = |message: String| TableError::SpreadsheetRead {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|err| read_err(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| read_err("workbook has no worksheets".into()))?
        .map_err(|err| read_err(err.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| cell.to_string()).collect(),
        None => {
            return Err(TableError::Empty {
                path: path.to_path_buf(),
            })
        }
    };
    let body = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();
    Ok(Table::new(headers, body))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(text) if text.is_empty() => Cell::Empty,
        Data::String(text) => Cell::Text(text.clone()),
        Data::Int(value) => Cell::Int(*value),
        Data::Float(value) => Cell::Float(*value),
        Data::Bool(value) => Cell::Bool(*value),
        Data::Error(err) => Cell::Error(err.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

/// Serialize the table as a single-sheet `.xlsx` workbook into `out`.
pub(super) fn write<W: Write>(table: &Table, mut out: W, path: &Path) -> Result<()> {
    let write_err = |message: String| TableError::SpreadsheetWrite {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers().iter().enumerate() {
        sheet
            .write_string(0, col as u16, header.as_str())
            .map_err(|err| write_err(err.to_string()))?;
    }
    for (idx, row) in table.rows().iter().enumerate() {
        let r = (idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            let written = match cell {
                Cell::Empty => continue,
                Cell::Int(value) => sheet.write_number(r, c, *value as f64),
                Cell::Float(value) if value.is_finite() => sheet.write_number(r, c, *value),
                Cell::Bool(value) => sheet.write_boolean(r, c, *value),
                other => sheet.write_string(r, c, other.to_string()),
            };
            written.map_err(|err| write_err(err.to_string()))?;
        }
    }

    let bytes = workbook
        .save_to_buffer()
        .map_err(|err| write_err(err.to_string()))?;
    out.write_all(&bytes).map_err(|source| TableError::Io {
        path: path.to_path_buf(),
        source,
    })
}
