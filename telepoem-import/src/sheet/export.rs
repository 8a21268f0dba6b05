//! Write split blocks to a workbook for inspection

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

use super::splitter::{SplitTables, TableBlock};
use super::value::Value;

/// Leading column holding the 1-based spreadsheet row of each block row
const SOURCE_ROW_COLUMN: &str = "_source_row";

/// Excel caps worksheet names at 31 characters
const MAX_SHEET_NAME: usize = 31;

/// Write every present block to its own worksheet.
///
/// Returns the number of worksheets written. Absent blocks are skipped.
pub fn write_blocks_excel(tables: &SplitTables, path: &Path) -> Result<usize> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let mut written = 0;
    let mut used = HashSet::new();

    for (index, (_, block)) in tables.iter().enumerate() {
        let Some(block) = block else {
            continue;
        };

        let name = unique_sheet_name(sheet_name(&block.name, index), &mut used);
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(name)?;
        write_block(worksheet, block, &header_format)?;
        written += 1;
    }

    if written == 0 {
        // A workbook needs at least one sheet to be valid
        workbook.add_worksheet().set_name("empty")?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;

    Ok(written)
}

fn write_block(ws: &mut Worksheet, block: &TableBlock, header_format: &Format) -> Result<()> {
    ws.write_string_with_format(0, 0, SOURCE_ROW_COLUMN, header_format)?;
    for (col, name) in block.headers.iter().enumerate() {
        ws.write_string_with_format(0, (col + 1) as u16, name, header_format)?;
    }

    for (row_idx, row) in block.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        ws.write_number(row_num, 0, (row.source_row + 1) as f64)?;
        for (col_idx, value) in row.cells.iter().enumerate() {
            write_value(ws, row_num, (col_idx + 1) as u16, value)?;
        }
    }

    Ok(())
}

fn write_value(ws: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<()> {
    match value {
        Value::Null => { /* Leave cell empty */ }
        Value::String(s) => { ws.write_string(row, col, s)?; }
        Value::Int(i) => { ws.write_number(row, col, *i as f64)?; }
        Value::Float(f) => { ws.write_number(row, col, *f)?; }
        Value::Bool(b) => { ws.write_boolean(row, col, *b)?; }
        Value::DateTime(_) | Value::Time(_) => {
            if let Some(text) = value.to_text() {
                ws.write_string(row, col, &text)?;
            }
        }
    }
    Ok(())
}

/// Make a table label usable as a worksheet name
fn sheet_name(label: &str, index: usize) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect();

    let cleaned = cleaned.trim_matches('\'').trim().to_string();
    if cleaned.is_empty() {
        format!("table_{}", index + 1)
    } else {
        cleaned
    }
}

/// Suffix `_2`, `_3`, ... until the name is free; Excel compares names case-insensitively
fn unique_sheet_name(name: String, used: &mut HashSet<String>) -> String {
    let mut candidate = name.clone();
    let mut n = 1;
    while !used.insert(candidate.to_lowercase()) {
        n += 1;
        let suffix = format!("_{}", n);
        let base: String = name.chars().take(MAX_SHEET_NAME - suffix.len()).collect();
        candidate = format!("{}{}", base, suffix);
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{Grid, load_first_sheet, split_tables};
    use calamine::{Reader, Xlsx, open_workbook};

    #[test]
    fn test_sheet_name() {
        assert_eq!(sheet_name("POET INFORMATION", 0), "POET INFORMATION");
        assert_eq!(sheet_name("a/b:c", 0), "a_b_c");
        assert_eq!(sheet_name("'  '", 2), "table_3");
        assert_eq!(sheet_name(&"x".repeat(40), 0).len(), 31);
    }

    #[test]
    fn test_unique_sheet_name() {
        let mut used = HashSet::new();
        assert_eq!(unique_sheet_name("Poet Info".into(), &mut used), "Poet Info");
        assert_eq!(unique_sheet_name("poet info".into(), &mut used), "poet info_2");
        assert_eq!(unique_sheet_name("Poet Info".into(), &mut used), "Poet Info_3");

        let long = "x".repeat(MAX_SHEET_NAME);
        assert_eq!(unique_sheet_name(long.clone(), &mut used), long);
        let second = unique_sheet_name(long.clone(), &mut used);
        assert_eq!(second.chars().count(), MAX_SHEET_NAME);
        assert!(second.ends_with("_2"));
    }

    #[test]
    fn test_write_blocks_excel_duplicate_labels() {
        let grid = Grid::from_text_rows(&[
            &["Poet Info", "Poet Info"],
            &["legalName", "city"],
            &["Smith, Jane", "Boston"],
        ]);
        let tables = split_tables(&grid);
        let path = std::env::temp_dir().join(format!("blocks-{}.xlsx", uuid::Uuid::new_v4()));

        let written = write_blocks_excel(&tables, &path).unwrap();
        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, 2);
        assert_eq!(
            workbook.sheet_names(),
            vec!["Poet Info".to_string(), "Poet Info_2".to_string()]
        );
    }

    #[test]
    fn test_write_blocks_excel() {
        let grid = Grid::from_text_rows(&[
            &["POET INFORMATION", "", "POEM INFORMATION"],
            &["legalName", "city", "title"],
            &["Smith, Jane", "Boston", "Sea Song"],
        ]);
        let tables = split_tables(&grid);
        let path = std::env::temp_dir().join(format!("blocks-{}.xlsx", uuid::Uuid::new_v4()));

        let written = write_blocks_excel(&tables, &path).unwrap();
        assert_eq!(written, 2);

        let workbook: Xlsx<_> = open_workbook(&path).unwrap();
        assert_eq!(
            workbook.sheet_names(),
            vec!["POET INFORMATION".to_string(), "POEM INFORMATION".to_string()]
        );

        // First sheet reads back with the source row column prepended
        let grid = load_first_sheet(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(grid.header()[0], Value::String(SOURCE_ROW_COLUMN.into()));
        assert_eq!(grid.header()[1], Value::String("legalName".into()));
        let (_, row) = grid.data_rows().next().unwrap();
        assert_eq!(row[0], Value::Int(3));
    }
}
