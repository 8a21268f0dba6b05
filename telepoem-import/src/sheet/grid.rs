//! Load the first worksheet of a workbook into a cell grid
//!
//! The importer only ever looks at the first sheet. Row 0 of the grid is the
//! super-header row carrying table-name markers, everything below it is data
//! (including the per-table column header row).

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto, open_workbook_auto_from_rs};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use super::value::Value;
use crate::error::ImportError;

/// Rectangular grid of normalized cell values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    rows: Vec<Vec<Value>>,
    width: usize,
}

impl Grid {
    /// Build a grid, padding short rows with nulls so every row has the same width
    pub fn new(mut rows: Vec<Vec<Value>>) -> Self {
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, Value::Null);
        }
        Grid { rows, width }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows including the super-header row
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The super-header row (empty for an empty sheet)
    pub fn header(&self) -> &[Value] {
        self.rows.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// All rows below the super-header, paired with their grid row index
    pub fn data_rows(&self) -> impl Iterator<Item = (usize, &[Value])> {
        self.rows
            .iter()
            .enumerate()
            .skip(1)
            .map(|(idx, row)| (idx, row.as_slice()))
    }

    /// Does any data row hold a value in this column?
    pub fn column_has_data(&self, col: usize) -> bool {
        self.data_rows()
            .any(|(_, row)| row.get(col).is_some_and(|v| !v.is_null()))
    }

    /// Build a grid from plain strings, blank strings become nulls
    #[cfg(test)]
    pub fn from_text_rows(rows: &[&[&str]]) -> Self {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| Value::text(*cell)).collect())
                .collect(),
        )
    }
}

/// Load the first worksheet of a workbook file (.xlsx, .xlsm, .xls, .ods)
pub fn load_first_sheet<P: AsRef<Path>>(path: P) -> Result<Grid> {
    let path = path.as_ref();
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    read_first_sheet(&mut workbook)
        .with_context(|| format!("Failed to read workbook: {}", path.display()))
}

/// Load the first worksheet from an in-memory workbook (e.g. an uploaded file)
pub fn load_first_sheet_from_bytes(bytes: Vec<u8>) -> Result<Grid> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .context("Failed to open workbook from bytes")?;

    read_first_sheet(&mut workbook)
}

fn read_first_sheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Grid> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(ImportError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Failed to read sheet: {}", sheet_name))?;

    log::debug!(
        "Loaded sheet '{}' ({} rows x {} columns)",
        sheet_name,
        range.height(),
        range.width()
    );

    Ok(range_to_grid(&range))
}

fn range_to_grid(range: &Range<Data>) -> Grid {
    Grid::new(
        range
            .rows()
            .map(|row| row.iter().map(cell_to_value).collect())
            .collect(),
    )
}

/// Convert an Excel cell into a grid value
fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::text(s.clone()),
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => {
            // Whole numbers come back as floats from most writers
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Value::Int(*f as i64)
            } else {
                Value::Float(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => serial_to_value(dt.as_f64(), dt.is_duration()),
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Value::DateTime)
            .unwrap_or_else(|_| Value::text(s.clone())),
        Data::DurationIso(s) => Value::text(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

/// Convert an Excel serial date (days since 1899-12-30) into a value.
///
/// Serials below one day, and explicit durations, are times of day. Durations
/// of a day or more are rendered as `HH:MM:SS` text with an open-ended hour.
fn serial_to_value(serial: f64, is_duration: bool) -> Value {
    if is_duration || (0.0..1.0).contains(&serial) {
        let total_secs = (serial * 86_400.0).round() as i64;
        if (0..86_400).contains(&total_secs) {
            if let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(total_secs as u32, 0)
            {
                return Value::Time(time);
            }
        }
        return Value::String(format!(
            "{:02}:{:02}:{:02}",
            total_secs / 3600,
            (total_secs % 3600) / 60,
            total_secs % 60
        ));
    }

    let Some(epoch) = NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0))
    else {
        return Value::Float(serial);
    };

    let millis = (serial * 86_400_000.0).round() as i64;
    epoch
        .checked_add_signed(Duration::milliseconds(millis))
        .map(Value::DateTime)
        .unwrap_or(Value::Float(serial))
}
