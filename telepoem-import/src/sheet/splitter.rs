//! Split a multi-table sheet into named blocks
//!
//! The master sheet lays several tables side by side. The super-header row
//! carries one label per table, placed above the first column of that table:
//!
//! ```text
//! | POET INFORMATION |      |     | POEM INFORMATION |     | tableSeperator | ...
//! | legalName        | city | ... | title            | ... | tableSeperator | ...
//! | Smith, Jane      | ...  |     | Sea Song         | ... |                | ...
//! ```
//!
//! A label opens a new block only when the column beneath it holds data; the
//! block runs until the next such label (or the end of the sheet).

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

use super::grid::Grid;
use super::value::Value;

/// Visual divider column between tables, never carries data
pub const TABLE_SEPARATOR_COLUMN: &str = "tableSeperator";

/// Placeholder labels produced by tools that name blank header cells
static PLACEHOLDER_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Unnamed: ?\d+$").expect("placeholder label pattern is valid"));

/// Column span of one named table in the sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpan {
    pub name: String,
    pub columns: Range<usize>,
}

/// One data row of a block
#[derive(Debug, Clone, PartialEq)]
pub struct BlockRow {
    /// Grid row the cells came from; rows of different blocks with the same
    /// source row describe the same spreadsheet line
    pub source_row: usize,
    /// Cells in block column order
    pub cells: Vec<Value>,
}

/// A clean rectangular sub-table cut out of the sheet
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    pub name: String,
    pub column_range: Range<usize>,
    pub headers: Vec<String>,
    pub rows: Vec<BlockRow>,
}

impl TableBlock {
    /// Position of a column by exact header name
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All tables found in a sheet, in sheet order.
///
/// A table whose label was found but which produced no usable rows or columns
/// is kept with a `None` block so callers can tell "absent" from "unknown".
#[derive(Debug, Clone, Default)]
pub struct SplitTables {
    tables: Vec<(String, Option<TableBlock>)>,
}

impl SplitTables {
    /// First non-absent block with this exact (case-sensitive) name
    pub fn get(&self, name: &str) -> Option<&TableBlock> {
        self.tables
            .iter()
            .filter(|(n, _)| n == name)
            .find_map(|(_, block)| block.as_ref())
    }

    /// Iterate over (name, block) pairs in sheet order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&TableBlock>)> {
        self.tables.iter().map(|(n, b)| (n.as_str(), b.as_ref()))
    }

    /// Number of labeled tables (absent ones included)
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of occurrences of a table label
    pub fn count(&self, name: &str) -> usize {
        self.tables.iter().filter(|(n, _)| n == name).count()
    }
}

fn is_placeholder_label(label: &str) -> bool {
    PLACEHOLDER_LABEL.is_match(label)
}

/// Find the column spans of every labeled table
pub fn find_table_spans(grid: &Grid) -> Vec<TableSpan> {
    let mut spans: Vec<TableSpan> = Vec::new();

    for (col, cell) in grid.header().iter().enumerate() {
        let Some(label) = cell.to_text() else {
            continue;
        };

        if is_placeholder_label(&label) || label == TABLE_SEPARATOR_COLUMN {
            continue;
        }

        if !grid.column_has_data(col) {
            continue;
        }

        if let Some(open) = spans.last_mut() {
            open.columns.end = col;
        }

        spans.push(TableSpan {
            name: label,
            columns: col..col,
        });
    }

    if let Some(open) = spans.last_mut() {
        open.columns.end = grid.width();
    }

    spans
}

/// Split the sheet into one block per labeled table
pub fn split_tables(grid: &Grid) -> SplitTables {
    let spans = find_table_spans(grid);

    // Rows that are blank across the whole sheet never take part; the first
    // remaining row holds the column names of every table
    let mut non_blank = grid
        .data_rows()
        .filter(|(_, row)| row.iter().any(|v| !v.is_null()));
    let column_header = non_blank.next();
    let data: Vec<(usize, &[Value])> = non_blank.collect();

    let tables = spans
        .into_iter()
        .map(|span| {
            let block = column_header.and_then(|(_, header)| {
                build_block(grid.header(), header, &data, &span)
            });
            if block.is_none() {
                log::debug!(
                    "Table '{}' (columns {}..{}) has no usable rows",
                    span.name,
                    span.columns.start,
                    span.columns.end
                );
            }
            (span.name, block)
        })
        .collect();

    SplitTables { tables }
}

fn build_block(
    super_header: &[Value],
    column_header: &[Value],
    data: &[(usize, &[Value])],
    span: &TableSpan,
) -> Option<TableBlock> {
    if span.columns.is_empty() || span.columns.end > column_header.len() {
        return None;
    }

    // Keep named columns, minus the separator (labelled in either header row)
    let mut kept: Vec<(usize, String)> = Vec::new();
    for col in span.columns.clone() {
        let Some(name) = column_header[col].to_text() else {
            continue;
        };
        let separator_above = super_header
            .get(col)
            .and_then(|v| v.to_text())
            .is_some_and(|label| label == TABLE_SEPARATOR_COLUMN);
        if name == TABLE_SEPARATOR_COLUMN || separator_above {
            continue;
        }
        kept.push((col, name));
    }

    if kept.is_empty() {
        return None;
    }

    let rows: Vec<BlockRow> = data
        .iter()
        .filter_map(|(source_row, row)| {
            let cells: Vec<Value> = kept
                .iter()
                .map(|(col, _)| row.get(*col).cloned().unwrap_or_default())
                .collect();
            if cells.iter().all(|v| v.is_null()) {
                None
            } else {
                Some(BlockRow {
                    source_row: *source_row,
                    cells,
                })
            }
        })
        .collect();

    if rows.is_empty() {
        return None;
    }

    Some(TableBlock {
        name: span.name.clone(),
        column_range: span.columns.clone(),
        headers: kept.into_iter().map(|(_, name)| name).collect(),
        rows,
    })
}
