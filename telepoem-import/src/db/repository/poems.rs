//! Poem rows

use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{Upserted, parse_id, parse_id_row};
use crate::import::records::PoemRecord;

/// Natural key a poem is matched on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoemKey<'a> {
    TelepoemNumber(&'a str),
    TitleAndPoet(&'a str, Uuid),
}

impl std::fmt::Display for PoemKey<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoemKey::TelepoemNumber(number) => write!(f, "telepoem number {}", number),
            PoemKey::TitleAndPoet(title, poet_id) => write!(f, "'{}' by poet {}", title, poet_id),
        }
    }
}

/// A poem record with its lookups resolved
#[derive(Debug, Clone)]
pub struct PoemFields<'a> {
    pub record: &'a PoemRecord,
    pub poet_id: Uuid,
    pub era_id: Option<Uuid>,
    pub poem_types: Option<String>,
    pub poem_topics: Option<String>,
    pub poem_special_tags: Option<String>,
    pub language: Option<String>,
    pub audio_link: Option<String>,
}

/// Find a poem by natural key
pub async fn find_poem_id(conn: &mut SqliteConnection, key: PoemKey<'_>) -> Result<Option<Uuid>> {
    let row: Option<(String,)> = match key {
        PoemKey::TelepoemNumber(number) => {
            sqlx::query_as("SELECT id FROM poem WHERE telepoemNumber = ? LIMIT 1")
                .bind(number)
                .fetch_optional(&mut *conn)
                .await
        }
        PoemKey::TitleAndPoet(title, poet_id) => {
            sqlx::query_as("SELECT id FROM poem WHERE title = ? AND poetId = ? LIMIT 1")
                .bind(title)
                .bind(poet_id.to_string())
                .fetch_optional(&mut *conn)
                .await
        }
    }
    .with_context(|| format!("Failed to look up poem by {}", key))?;

    parse_id_row(row)
}

async fn insert_poem(conn: &mut SqliteConnection, poem: &PoemFields<'_>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let record = poem.record;

    sqlx::query(
        r#"
        INSERT INTO poem (
            id, title, poetId, image, audioLink, producerName, narratorName,
            recordingDate, recordingSource, poemEra, poemTypes, poemTopics,
            poemSpecialTags, language, active, optionalLegal, isChildrensPoem,
            isAdultPoem, recordingDuration, telepoemNumber, copyRights, poemText
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(record.title.as_deref().unwrap_or(""))
    .bind(poem.poet_id.to_string())
    .bind(&record.image)
    .bind(&poem.audio_link)
    .bind(&record.producer_name)
    .bind(&record.narrator_name)
    .bind(record.recording_date)
    .bind(&record.recording_source)
    .bind(poem.era_id.map(|id| id.to_string()))
    .bind(&poem.poem_types)
    .bind(&poem.poem_topics)
    .bind(&poem.poem_special_tags)
    .bind(&poem.language)
    .bind(record.active.unwrap_or(false))
    .bind(&record.optional_legal)
    .bind(record.is_childrens_poem.unwrap_or(false))
    .bind(record.is_adult_poem.unwrap_or(false))
    .bind(&record.recording_duration)
    .bind(&record.telepoem_number)
    .bind(&record.copy_rights)
    .bind(&record.poem_text)
    .execute(&mut *conn)
    .await
    .context("Failed to insert poem")?;

    Ok(id)
}

async fn update_poem(conn: &mut SqliteConnection, id: Uuid, poem: &PoemFields<'_>) -> Result<()> {
    let record = poem.record;

    // poetId always follows the sheet so it stays in step with poet_and_poem
    sqlx::query(
        r#"
        UPDATE poem SET
            title = COALESCE(?, title),
            poetId = ?,
            image = COALESCE(?, image),
            audioLink = COALESCE(?, audioLink),
            producerName = COALESCE(?, producerName),
            narratorName = COALESCE(?, narratorName),
            recordingDate = COALESCE(?, recordingDate),
            recordingSource = COALESCE(?, recordingSource),
            poemEra = COALESCE(?, poemEra),
            poemTypes = COALESCE(?, poemTypes),
            poemTopics = COALESCE(?, poemTopics),
            poemSpecialTags = COALESCE(?, poemSpecialTags),
            language = COALESCE(?, language),
            active = COALESCE(?, active),
            optionalLegal = COALESCE(?, optionalLegal),
            isChildrensPoem = COALESCE(?, isChildrensPoem),
            isAdultPoem = COALESCE(?, isAdultPoem),
            recordingDuration = COALESCE(?, recordingDuration),
            telepoemNumber = COALESCE(?, telepoemNumber),
            copyRights = COALESCE(?, copyRights),
            poemText = COALESCE(?, poemText)
        WHERE id = ?
        "#,
    )
    .bind(&record.title)
    .bind(poem.poet_id.to_string())
    .bind(&record.image)
    .bind(&poem.audio_link)
    .bind(&record.producer_name)
    .bind(&record.narrator_name)
    .bind(record.recording_date)
    .bind(&record.recording_source)
    .bind(poem.era_id.map(|id| id.to_string()))
    .bind(&poem.poem_types)
    .bind(&poem.poem_topics)
    .bind(&poem.poem_special_tags)
    .bind(&poem.language)
    .bind(record.active)
    .bind(&record.optional_legal)
    .bind(record.is_childrens_poem)
    .bind(record.is_adult_poem)
    .bind(&record.recording_duration)
    .bind(&record.telepoem_number)
    .bind(&record.copy_rights)
    .bind(&record.poem_text)
    .bind(id.to_string())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update poem {}", id))?;

    Ok(())
}

/// Insert or sparsely update a poem matched by `key`
pub async fn upsert_poem(
    conn: &mut SqliteConnection,
    key: PoemKey<'_>,
    poem: &PoemFields<'_>,
) -> Result<Upserted> {
    match find_poem_id(conn, key).await? {
        Some(id) => {
            update_poem(conn, id, poem).await?;
            Ok(Upserted::updated(id))
        }
        None => Ok(Upserted::created(insert_poem(conn, poem).await?)),
    }
}

/// Every poem carrying a telepoem number, as (id, number)
pub async fn list_numbered_poems(conn: &mut SqliteConnection) -> Result<Vec<(Uuid, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT id, telepoemNumber FROM poem WHERE telepoemNumber IS NOT NULL AND telepoemNumber != '' ORDER BY telepoemNumber",
    )
    .fetch_all(&mut *conn)
    .await
    .context("Failed to list poems")?;

    rows.into_iter()
        .map(|(id, number)| Ok((parse_id(&id)?, number)))
        .collect()
}

/// Overwrite a poem's audio link
pub async fn set_audio_link(conn: &mut SqliteConnection, id: Uuid, link: &str) -> Result<()> {
    sqlx::query("UPDATE poem SET audioLink = ? WHERE id = ?")
        .bind(link)
        .bind(id.to_string())
        .execute(&mut *conn)
        .await
        .with_context(|| format!("Failed to set audio link on poem {}", id))?;

    Ok(())
}
