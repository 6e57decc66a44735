//! Input-file loading: pull identifiers out of spreadsheet, CSV or plain
//! text files, optionally restricted to one named column.

use std::fs;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use sirene_core::{extract_sirens, extract_sirens_from_cells, Siren};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("could not read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not open workbook {path}: {message}")]
    Workbook { path: String, message: String },
    #[error("workbook {path} has no worksheet")]
    NoWorksheet { path: String },
    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("column {column:?} not found; available columns: {}", available.join(", "))]
    UnknownColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Extract every distinct identifier from a file, in first-seen order.
///
/// `.xlsx`/`.xls` files are read through their first worksheet, `.csv`
/// with a `,`/`;` delimiter sniff; anything else is treated as plain
/// text. With `column` set, only that column of a tabular file is
/// scanned; otherwise every cell of every column is.
pub fn load_sirens(path: &Path, column: Option<&str>) -> Result<Vec<Siren>, InputError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xls" => load_from_workbook(path, column),
        "csv" => load_from_csv(path, column),
        _ => load_from_text(path),
    }
}

fn load_from_workbook(path: &Path, column: Option<&str>) -> Result<Vec<Siren>, InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|err| InputError::Workbook {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(InputError::NoWorksheet {
            path: path.display().to_string(),
        });
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|err| InputError::Workbook {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;

    match column {
        None => {
            let cells = range.rows().flat_map(|row| row.iter().filter_map(cell_string));
            Ok(extract_sirens_from_cells(cells))
        }
        Some(name) => {
            let mut rows = range.rows();
            let header: &[Data] = rows.next().unwrap_or(&[]);
            let labels: Vec<String> = header
                .iter()
                .map(|cell| cell_string(cell).unwrap_or_default())
                .collect();
            let index = find_column(&labels, name)?;
            let cells = rows.filter_map(|row| row.get(index).and_then(cell_string));
            Ok(extract_sirens_from_cells(cells))
        }
    }
}

fn load_from_csv(path: &Path, column: Option<&str>) -> Result<Vec<Siren>, InputError> {
    let content = fs::read_to_string(path).map_err(|err| InputError::Io {
        path: path.display().to_string(),
        source: err,
    })?;

    match column {
        // Cell separators are non-digits, so one extraction pass over the
        // raw text sees every cell of every column.
        None => Ok(extract_sirens(&content)),
        Some(name) => {
            let mut reader = csv::ReaderBuilder::new()
                .delimiter(sniff_delimiter(&content))
                .flexible(true)
                .from_reader(content.as_bytes());
            let labels: Vec<String> = reader
                .headers()
                .map_err(|err| csv_error(path, err))?
                .iter()
                .map(|label| label.to_string())
                .collect();
            let index = find_column(&labels, name)?;

            let mut cells = Vec::new();
            for record in reader.records() {
                let record = record.map_err(|err| csv_error(path, err))?;
                if let Some(cell) = record.get(index) {
                    cells.push(cell.to_string());
                }
            }
            Ok(extract_sirens_from_cells(cells))
        }
    }
}

fn load_from_text(path: &Path) -> Result<Vec<Siren>, InputError> {
    let content = fs::read_to_string(path).map_err(|err| InputError::Io {
        path: path.display().to_string(),
        source: err,
    })?;
    Ok(extract_sirens(&content))
}

/// Best-effort cell conversion; numeric cells matter because spreadsheet
/// programs routinely store identifiers as numbers.
fn cell_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(s.trim().to_string()),
        Data::Float(f) => Some(format!("{f}")),
        Data::Int(i) => Some(format!("{i}")),
        Data::Bool(b) => Some(b.to_string()),
        other => Some(format!("{other}")),
    }
}

fn find_column(labels: &[String], wanted: &str) -> Result<usize, InputError> {
    labels
        .iter()
        .position(|label| label.trim() == wanted.trim())
        .ok_or_else(|| InputError::UnknownColumn {
            column: wanted.to_string(),
            available: labels.to_vec(),
        })
}

/// French exports commonly use `;`; decide from the header line.
fn sniff_delimiter(content: &str) -> u8 {
    let first_line = content.lines().next().unwrap_or_default();
    if first_line.matches(';').count() > first_line.matches(',').count() {
        b';'
    } else {
        b','
    }
}

fn csv_error(path: &Path, err: csv::Error) -> InputError {
    InputError::Csv {
        path: path.display().to_string(),
        source: err,
    }
}
