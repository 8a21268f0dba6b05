//! Poem collection rows

use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{Upserted, parse_id_row};

pub async fn find_collection_id(conn: &mut SqliteConnection, name: &str) -> Result<Option<Uuid>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT id FROM poem_collection WHERE poemCollectionName = ? LIMIT 1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("Failed to look up collection '{}'", name))?;

    parse_id_row(row)
}

/// Insert a collection or refresh its description
pub async fn upsert_collection(
    conn: &mut SqliteConnection,
    name: &str,
    description: Option<&str>,
) -> Result<Upserted> {
    if let Some(id) = find_collection_id(conn, name).await? {
        sqlx::query(
            r#"
            UPDATE poem_collection SET
                poemCollectionDescription = COALESCE(?, poemCollectionDescription),
                updatedAt = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(description)
        .bind(id.to_string())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to update collection '{}'", name))?;

        return Ok(Upserted::updated(id));
    }

    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO poem_collection (id, poemCollectionName, poemCollectionDescription) VALUES (?, ?, ?)",
    )
    .bind(id.to_string())
    .bind(name)
    .bind(description)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to insert collection '{}'", name))?;

    Ok(Upserted::created(id))
}
