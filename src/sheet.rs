use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use tracing::info;

use crate::error::{DeliveryError, Result};
use crate::import::{CellValue, Row};

/// Reads the first sheet of a roster file into header-keyed rows.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let rows = match extension.as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        other => {
            return Err(sheet_error(path, format!("unsupported file type '{other}'")));
        }
    };

    info!(path = %path.display(), rows = rows.len(), "spreadsheet read");
    Ok(rows)
}

fn sheet_error(path: &Path, reason: impl ToString) -> DeliveryError {
    DeliveryError::Sheet {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

pub fn read_csv(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| sheet_error(path, e))?;

    let headers = reader.headers().map_err(|e| sheet_error(path, e))?.clone();
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| sheet_error(path, e))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, value)| (header.to_string(), CellValue::Text(value.to_string())))
            .collect();

        if !is_blank(&row) {
            rows.push(row);
        }
    }

    Ok(rows)
}

pub fn read_workbook(path: &Path) -> Result<Vec<Row>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_error(path, e))?;
    let first_sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| sheet_error(path, "workbook contains no sheets"))?;
    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| sheet_error(path, e))?;

    let mut lines = range.rows();
    let headers: Vec<String> = match lines.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Ok(Vec::new()),
    };

    let mut rows = Vec::new();
    for line in lines {
        let row: Row = headers
            .iter()
            .zip(line.iter())
            .filter(|(header, _)| !header.is_empty())
            .filter_map(|(header, cell)| cell_value(cell).map(|value| (header.clone(), value)))
            .collect();

        if !is_blank(&row) {
            rows.push(row);
        }
    }

    Ok(rows)
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        Some(CellValue::Text(text)) => text.trim().to_string(),
        Some(CellValue::Number(n)) if n.fract() == 0.0 => format!("{}", n as i64),
        Some(CellValue::Number(n)) => n.to_string(),
        None => String::new(),
    }
}

fn cell_value(cell: &Data) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Float(n) => Some(CellValue::Number(*n)),
        Data::Int(n) => Some(CellValue::Number(*n as f64)),
        Data::Bool(b) => Some(CellValue::Text(b.to_string())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::DateTime(dt) => Some(CellValue::Number(dt.as_f64())),
        Data::Error(_) => None,
    }
}

fn is_blank(row: &Row) -> bool {
    row.values().all(|value| match value {
        CellValue::Text(text) => text.trim().is_empty(),
        CellValue::Number(_) => false,
    })
}
