//! Lookup (dimension) tables: one `name` per row

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::parse_id_row;

/// The dimension tables resolved by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    Era,
    Language,
    PoemTopic,
    PoemType,
    SpecialTag,
    PhoneType,
    BoothType,
    DirectoryType,
    BoothMaintainer,
}

impl LookupKind {
    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            LookupKind::Era => "era",
            LookupKind::Language => "language",
            LookupKind::PoemTopic => "poem_topic",
            LookupKind::PoemType => "poem_type",
            LookupKind::SpecialTag => "special_tag",
            LookupKind::PhoneType => "phone_type",
            LookupKind::BoothType => "telepoem_booth_type",
            LookupKind::DirectoryType => "directory_type",
            LookupKind::BoothMaintainer => "booth_maintainer",
        }
    }

    /// Human-readable label for logs and reports
    pub fn label(&self) -> &'static str {
        match self {
            LookupKind::Era => "era",
            LookupKind::Language => "language",
            LookupKind::PoemTopic => "poem topic",
            LookupKind::PoemType => "poem type",
            LookupKind::SpecialTag => "special tag",
            LookupKind::PhoneType => "phone type",
            LookupKind::BoothType => "booth type",
            LookupKind::DirectoryType => "directory type",
            LookupKind::BoothMaintainer => "booth maintainer",
        }
    }

    /// Get all variants
    pub fn all() -> &'static [LookupKind] {
        &[
            LookupKind::Era,
            LookupKind::Language,
            LookupKind::PoemTopic,
            LookupKind::PoemType,
            LookupKind::SpecialTag,
            LookupKind::PhoneType,
            LookupKind::BoothType,
            LookupKind::DirectoryType,
            LookupKind::BoothMaintainer,
        ]
    }
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Find a lookup row by exact name
pub async fn find_lookup_id(
    conn: &mut SqliteConnection,
    kind: LookupKind,
    name: &str,
) -> Result<Option<Uuid>> {
    let sql = format!("SELECT id FROM {} WHERE name = ? LIMIT 1", kind.table());
    let row: Option<(String,)> = sqlx::query_as(&sql)
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .with_context(|| format!("Failed to look up {} '{}'", kind, name))?;

    parse_id_row(row)
}

/// Insert a lookup row with a fresh id
pub async fn insert_lookup(conn: &mut SqliteConnection, kind: LookupKind, name: &str) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let sql = format!("INSERT INTO {} (id, name) VALUES (?, ?)", kind.table());
    sqlx::query(&sql)
        .bind(id.to_string())
        .bind(name)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to insert {} '{}'", kind, name))?;

    Ok(id)
}
