//! Poet rows

use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{Upserted, parse_id_row};
use crate::import::records::PoetRecord;

/// Find a poet by legal name
pub async fn find_poet_id(
    conn: &mut SqliteConnection,
    first_name: &str,
    last_name: &str,
) -> Result<Option<Uuid>> {
    let row: Option<(String,)> = sqlx::query_as(
        "SELECT id FROM poet WHERE legalFirstName = ? AND legalLastName = ? LIMIT 1",
    )
    .bind(first_name)
    .bind(last_name)
    .fetch_optional(&mut *conn)
    .await
    .with_context(|| format!("Failed to look up poet '{} {}'", first_name, last_name))?;

    parse_id_row(row)
}

async fn insert_poet(conn: &mut SqliteConnection, poet: &PoetRecord) -> Result<Uuid> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO poet (
            id, legalFirstName, legalLastName, creditedFirstName, creditedLastName,
            website, address, email, phoneNum, city, state, zipCode,
            status, isLaureate, photoCredit, poetImage, poetBiography
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&poet.legal_first_name)
    .bind(&poet.legal_last_name)
    .bind(&poet.credited_first_name)
    .bind(&poet.credited_last_name)
    .bind(&poet.website)
    .bind(&poet.address)
    .bind(&poet.email)
    .bind(&poet.phone_num)
    .bind(&poet.city)
    .bind(&poet.state)
    .bind(&poet.zip_code)
    .bind(poet.status.unwrap_or(false))
    .bind(poet.is_laureate.unwrap_or(false))
    .bind(&poet.photo_credit)
    .bind(&poet.poet_image)
    .bind(&poet.poet_biography)
    .execute(&mut *conn)
    .await
    .context("Failed to insert poet")?;

    Ok(id)
}

async fn update_poet(conn: &mut SqliteConnection, id: Uuid, poet: &PoetRecord) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE poet SET
            creditedFirstName = COALESCE(?, creditedFirstName),
            creditedLastName = COALESCE(?, creditedLastName),
            website = COALESCE(?, website),
            address = COALESCE(?, address),
            email = COALESCE(?, email),
            phoneNum = COALESCE(?, phoneNum),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            zipCode = COALESCE(?, zipCode),
            status = COALESCE(?, status),
            isLaureate = COALESCE(?, isLaureate),
            photoCredit = COALESCE(?, photoCredit),
            poetImage = COALESCE(?, poetImage),
            poetBiography = COALESCE(?, poetBiography)
        WHERE id = ?
        "#,
    )
    .bind(&poet.credited_first_name)
    .bind(&poet.credited_last_name)
    .bind(&poet.website)
    .bind(&poet.address)
    .bind(&poet.email)
    .bind(&poet.phone_num)
    .bind(&poet.city)
    .bind(&poet.state)
    .bind(&poet.zip_code)
    .bind(poet.status)
    .bind(poet.is_laureate)
    .bind(&poet.photo_credit)
    .bind(&poet.poet_image)
    .bind(&poet.poet_biography)
    .bind(id.to_string())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update poet {}", id))?;

    Ok(())
}

/// Insert or sparsely update a poet matched by legal name
pub async fn upsert_poet(conn: &mut SqliteConnection, poet: &PoetRecord) -> Result<Upserted> {
    match find_poet_id(conn, &poet.legal_first_name, &poet.legal_last_name).await? {
        Some(id) => {
            update_poet(conn, id, poet).await?;
            Ok(Upserted::updated(id))
        }
        None => Ok(Upserted::created(insert_poet(conn, poet).await?)),
    }
}
