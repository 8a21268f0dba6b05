//! Booth rows

use anyhow::{Context, Result};
use sqlx::SqliteConnection;
use uuid::Uuid;

use super::{Upserted, parse_id_row};
use crate::import::records::BoothDetails;

/// One expanded booth with its lookups resolved
#[derive(Debug, Clone)]
pub struct BoothFields<'a> {
    pub booth_name: &'a str,
    pub number: Option<&'a str>,
    pub phone_type_id: Option<Uuid>,
    pub booth_type_id: Option<Uuid>,
    pub directory_type_id: Option<Uuid>,
    pub booth_maintainer_id: Option<Uuid>,
    pub details: &'a BoothDetails,
}

fn id_text(id: Option<Uuid>) -> Option<String> {
    id.map(|id| id.to_string())
}

/// Find a booth by name and maintainer; a missing maintainer only matches
/// booths without one
pub async fn find_booth_id(
    conn: &mut SqliteConnection,
    booth_name: &str,
    maintainer_id: Option<Uuid>,
) -> Result<Option<Uuid>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT id FROM booth WHERE boothName = ? AND boothMaintainerId IS ? LIMIT 1")
            .bind(booth_name)
            .bind(id_text(maintainer_id))
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("Failed to look up booth '{}'", booth_name))?;

    parse_id_row(row)
}

async fn insert_booth(conn: &mut SqliteConnection, booth: &BoothFields<'_>) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let details = booth.details;

    sqlx::query(
        r#"
        INSERT INTO booth (
            id, boothName, number, phoneTypeId, boothTypeId, directoryTypeId,
            boothMaintainerId, directoryTabletSerialNumber, physicalAddress, city,
            state, zipCode, installationDate, installationType, active,
            isADAAccessible, phoneSerialNumber, highlightedCriteria,
            installationNotes, deviceInfo, boothImage
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(booth.booth_name)
    .bind(booth.number)
    .bind(id_text(booth.phone_type_id))
    .bind(id_text(booth.booth_type_id))
    .bind(id_text(booth.directory_type_id))
    .bind(id_text(booth.booth_maintainer_id))
    .bind(&details.directory_tablet_serial_number)
    .bind(&details.physical_address)
    .bind(&details.city)
    .bind(&details.state)
    .bind(&details.zip_code)
    .bind(&details.installation_date)
    .bind(&details.installation_type)
    .bind(details.active.unwrap_or(true))
    .bind(details.is_ada_accessible.unwrap_or(false))
    .bind(&details.phone_serial_number)
    .bind(&details.highlighted_criteria)
    .bind(&details.installation_notes)
    .bind(&details.device_info)
    .bind(&details.booth_image)
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to insert booth '{}'", booth.booth_name))?;

    Ok(id)
}

async fn update_booth(conn: &mut SqliteConnection, id: Uuid, booth: &BoothFields<'_>) -> Result<()> {
    let details = booth.details;

    sqlx::query(
        r#"
        UPDATE booth SET
            number = COALESCE(?, number),
            phoneTypeId = COALESCE(?, phoneTypeId),
            boothTypeId = COALESCE(?, boothTypeId),
            directoryTypeId = COALESCE(?, directoryTypeId),
            directoryTabletSerialNumber = COALESCE(?, directoryTabletSerialNumber),
            physicalAddress = COALESCE(?, physicalAddress),
            city = COALESCE(?, city),
            state = COALESCE(?, state),
            zipCode = COALESCE(?, zipCode),
            installationDate = COALESCE(?, installationDate),
            installationType = COALESCE(?, installationType),
            active = COALESCE(?, active),
            isADAAccessible = COALESCE(?, isADAAccessible),
            phoneSerialNumber = COALESCE(?, phoneSerialNumber),
            highlightedCriteria = COALESCE(?, highlightedCriteria),
            installationNotes = COALESCE(?, installationNotes),
            deviceInfo = COALESCE(?, deviceInfo),
            boothImage = COALESCE(?, boothImage),
            updateDate = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(booth.number)
    .bind(id_text(booth.phone_type_id))
    .bind(id_text(booth.booth_type_id))
    .bind(id_text(booth.directory_type_id))
    .bind(&details.directory_tablet_serial_number)
    .bind(&details.physical_address)
    .bind(&details.city)
    .bind(&details.state)
    .bind(&details.zip_code)
    .bind(&details.installation_date)
    .bind(&details.installation_type)
    .bind(details.active)
    .bind(details.is_ada_accessible)
    .bind(&details.phone_serial_number)
    .bind(&details.highlighted_criteria)
    .bind(&details.installation_notes)
    .bind(&details.device_info)
    .bind(&details.booth_image)
    .bind(id.to_string())
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to update booth {}", id))?;

    Ok(())
}

/// Insert or sparsely update a booth matched by name and maintainer
pub async fn upsert_booth(conn: &mut SqliteConnection, booth: &BoothFields<'_>) -> Result<Upserted> {
    match find_booth_id(conn, booth.booth_name, booth.booth_maintainer_id).await? {
        Some(id) => {
            update_booth(conn, id, booth).await?;
            Ok(Upserted::updated(id))
        }
        None => Ok(Upserted::created(insert_booth(conn, booth).await?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::lookups::{LookupKind, insert_lookup};
    use crate::db::{count_rows, memory_pool};

    fn booth<'a>(name: &'a str, maintainer: Option<Uuid>, details: &'a BoothDetails) -> BoothFields<'a> {
        BoothFields {
            booth_name: name,
            number: None,
            phone_type_id: None,
            booth_type_id: None,
            directory_type_id: None,
            booth_maintainer_id: maintainer,
            details,
        }
    }

    #[tokio::test]
    async fn test_maintainer_is_part_of_key() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let maintainer = insert_lookup(&mut conn, LookupKind::BoothMaintainer, "Parks Dept")
            .await
            .unwrap();
        let details = BoothDetails::default();

        let unowned = upsert_booth(&mut conn, &booth("Library", None, &details)).await.unwrap();
        let owned = upsert_booth(&mut conn, &booth("Library", Some(maintainer), &details))
            .await
            .unwrap();
        assert_ne!(unowned.id, owned.id);

        // Null maintainer matches the unowned booth again
        let again = upsert_booth(&mut conn, &booth("Library", None, &details)).await.unwrap();
        assert_eq!(again.id, unowned.id);
        assert!(!again.created);

        drop(conn);
        assert_eq!(count_rows(&pool, "booth").await, 2);
    }

    #[tokio::test]
    async fn test_active_defaults_true_and_zip_keeps_zeros() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        let details = BoothDetails {
            zip_code: Some("02134".to_string()),
            ..Default::default()
        };

        let id = upsert_booth(&mut conn, &booth("Depot", None, &details)).await.unwrap().id;

        let (active, zip): (bool, Option<String>) =
            sqlx::query_as("SELECT active, zipCode FROM booth WHERE id = ?")
                .bind(id.to_string())
                .fetch_one(&mut *conn)
                .await
                .unwrap();
        assert!(active);
        assert_eq!(zip.as_deref(), Some("02134"));
    }
}
