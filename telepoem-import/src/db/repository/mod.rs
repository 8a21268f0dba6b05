//! Repository layer for the target tables
//!
//! Every function takes the run's connection explicitly (normally the open
//! transaction) so all reads observe the run's own writes.

pub mod booths;
pub mod collections;
pub mod links;
pub mod lookups;
pub mod poems;
pub mod poets;

use anyhow::{Context, Result};
use uuid::Uuid;

/// Outcome of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: Uuid,
    /// True if a new row was inserted, false if an existing one was updated
    pub created: bool,
}

impl Upserted {
    pub fn created(id: Uuid) -> Self {
        Self { id, created: true }
    }

    pub fn updated(id: Uuid) -> Self {
        Self { id, created: false }
    }
}

/// Parse a stored id column
pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Stored id is not a UUID: {}", raw))
}

/// Parse an optional id row
pub(crate) fn parse_id_row(row: Option<(String,)>) -> Result<Option<Uuid>> {
    row.map(|(raw,)| parse_id(&raw)).transpose()
}
