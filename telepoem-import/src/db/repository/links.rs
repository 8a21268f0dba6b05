//! Associative link tables

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

/// The many-to-many relations maintained by the importer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    PoetAndPoem,
    PoemCollectionAndPoem,
    BoothAndPoemCollection,
}

impl LinkKind {
    /// (table, left column, right column)
    fn columns(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            LinkKind::PoetAndPoem => ("poet_and_poem", "poetId", "poemId"),
            LinkKind::PoemCollectionAndPoem => ("poem_collection_and_poem", "poemCollectionId", "poemId"),
            LinkKind::BoothAndPoemCollection => ("booth_and_poem_collection", "boothId", "poemCollectionId"),
        }
    }

    pub fn table(&self) -> &'static str {
        self.columns().0
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table())
    }
}

/// Create a link unless the pair already exists. Returns true if created.
pub async fn ensure_link(
    conn: &mut SqliteConnection,
    kind: LinkKind,
    left: Uuid,
    right: Uuid,
) -> Result<bool> {
    let (table, left_col, right_col) = kind.columns();

    let existing: Option<(String,)> = sqlx::query_as(&format!(
        "SELECT id FROM {} WHERE {} = ? AND {} = ? LIMIT 1",
        table, left_col, right_col
    ))
    .bind(left.to_string())
    .bind(right.to_string())
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("Failed to look up {} link", kind))?;

    if existing.is_some() {
        return Ok(false);
    }

    sqlx::query(&format!(
        "INSERT INTO {} (id, {}, {}) VALUES (?, ?, ?)",
        table, left_col, right_col
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(left.to_string())
    .bind(right.to_string())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to insert {} link", kind))?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::collections::upsert_collection;
    use crate::db::{count_rows, memory_pool};

    #[tokio::test]
    async fn test_link_created_once() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let collection = upsert_collection(&mut conn, "Night", None).await.unwrap().id;
        sqlx::query("INSERT INTO booth (id, boothName) VALUES (?, 'Depot')")
            .bind(Uuid::nil().to_string())
            .execute(&mut *conn)
            .await
            .unwrap();

        let kind = LinkKind::BoothAndPoemCollection;
        assert!(ensure_link(&mut conn, kind, Uuid::nil(), collection).await.unwrap());
        assert!(!ensure_link(&mut conn, kind, Uuid::nil(), collection).await.unwrap());

        drop(conn);
        assert_eq!(count_rows(&pool, kind.table()).await, 1);
    }
}
