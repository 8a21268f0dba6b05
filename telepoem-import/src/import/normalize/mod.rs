//! Turn raw table blocks into typed entity records
//!
//! Each table has a rename map from sheet headers to canonical field names.
//! Headers with no canonical field are ignored (logged at debug).

mod booth;
mod collection;
mod poem;
mod poet;
pub mod text;

pub use booth::normalize_booths;
pub use collection::normalize_collections;
pub use poem::normalize_poems;
pub use poet::normalize_poets;

use std::collections::HashMap;

use crate::sheet::{BlockRow, TableBlock, Value};

/// A record tagged with the sheet row it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub source_row: usize,
    pub record: T,
}

/// A row that could not become a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub source_row: usize,
    pub reason: String,
}

/// Normalization output for one block
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized<T> {
    pub records: Vec<Sourced<T>>,
    pub skipped: Vec<SkippedRow>,
}

impl<T> Default for Normalized<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Normalized<T> {
    fn push(&mut self, row: &BlockRow, record: T) {
        self.records.push(Sourced {
            source_row: row.source_row,
            record,
        });
    }

    fn skip(&mut self, row: &BlockRow, reason: impl Into<String>) {
        let reason = reason.into();
        log::warn!("Skipping sheet row {}: {}", row.source_row + 1, reason);
        self.skipped.push(SkippedRow {
            source_row: row.source_row,
            reason,
        });
    }
}

/// Canonical field lookup over a block
pub(crate) struct BlockView<'a> {
    block: &'a TableBlock,
    fields: HashMap<&'static str, usize>,
}

impl<'a> BlockView<'a> {
    /// Map block headers to canonical fields.
    ///
    /// `renames` maps sheet headers to canonical names; `fields` lists every
    /// canonical name the table understands.
    pub fn new(block: &'a TableBlock, renames: &[(&str, &'static str)], fields: &[&'static str]) -> Self {
        let mut mapped = HashMap::new();

        for (index, header) in block.headers.iter().enumerate() {
            let canonical = renames
                .iter()
                .find(|(from, _)| *from == header.as_str())
                .map(|(_, to)| *to)
                .or_else(|| fields.iter().copied().find(|f| *f == header.as_str()));

            match canonical {
                Some(field) => {
                    // First occurrence wins on duplicate headers
                    mapped.entry(field).or_insert(index);
                }
                None => log::debug!("{}: ignoring column '{}'", block.name, header),
            }
        }

        Self { block, fields: mapped }
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a BlockRow> + 'a {
        self.block.rows.iter()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Raw cell of a field, `Null` if the column is missing
    pub fn value<'r>(&self, row: &'r BlockRow, field: &str) -> &'r Value {
        static NULL: Value = Value::Null;
        self.fields
            .get(field)
            .and_then(|&index| row.cells.get(index))
            .unwrap_or(&NULL)
    }

    /// Trimmed display text of a field
    pub fn text(&self, row: &BlockRow, field: &str) -> Option<String> {
        self.value(row, field).to_text()
    }

    /// Marker flag; blank means not provided
    pub fn flag(&self, row: &BlockRow, field: &str, truthy: &[&str]) -> Option<bool> {
        match self.value(row, field) {
            Value::Bool(b) => Some(*b),
            other => other.to_text().map(|raw| text::flag(&raw, truthy)),
        }
    }

    pub fn list(&self, row: &BlockRow, field: &str, separator: &str) -> Vec<String> {
        self.text(row, field)
            .map(|raw| text::split_list(&raw, separator))
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::sheet::{BlockRow, TableBlock, Value};

    /// Build a block from text cells; row `i` gets source row `i + 2`
    pub fn block(name: &str, headers: &[&str], rows: &[&[&str]]) -> TableBlock {
        TableBlock {
            name: name.to_string(),
            column_range: 0..headers.len(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .enumerate()
                .map(|(i, cells)| BlockRow {
                    source_row: i + 2,
                    cells: cells.iter().map(|c| Value::text(*c)).collect(),
                })
                .collect(),
        }
    }
}
