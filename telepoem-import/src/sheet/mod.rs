//! Spreadsheet loading and multi-table splitting

mod export;
mod grid;
mod splitter;
mod value;

pub use export::write_blocks_excel;
pub use grid::{Grid, load_first_sheet, load_first_sheet_from_bytes};
pub use splitter::{BlockRow, SplitTables, TableBlock, TableSpan, find_table_spans, split_tables};
pub use value::Value;
