//! Idempotent import of a master sheet into the store
//!
//! Tables are imported in dependency order (poets, poems, booths, poem
//! collections) inside one transaction. Blocks are related through the sheet
//! row their rows came from: the poem on row r belongs to the poet on row r,
//! and the collections on row r hold that poem and every booth of row r.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::audio::AudioIndex;
use super::normalize::{
    Normalized, normalize_booths, normalize_collections, normalize_poems, normalize_poets,
};
use super::report::{EntityCounts, RunOutcome, RunReport};
use super::resolver::{LookupResolver, join_ids};
use crate::config::{ImportConfig, PoemKeyPolicy};
use crate::db::repository::booths::{BoothFields, upsert_booth};
use crate::db::repository::collections::upsert_collection;
use crate::db::repository::links::{LinkKind, ensure_link};
use crate::db::repository::lookups::LookupKind;
use crate::db::repository::poems::{PoemFields, PoemKey, upsert_poem};
use crate::db::repository::poets::upsert_poet;
use crate::sheet::{Grid, SplitTables, TableBlock, split_tables};

/// Importable tables and their sheet labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Poets,
    Poems,
    Booths,
    Collections,
}

impl TableKind {
    pub fn label(&self) -> &'static str {
        match self {
            TableKind::Poets => "POET INFORMATION",
            TableKind::Poems => "POEM INFORMATION",
            TableKind::Booths => "BOOTH INFORMATION",
            TableKind::Collections => "PoemCollection Information",
        }
    }

    /// Exact, case-sensitive label match
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|kind| kind.label() == label)
    }

    /// Import order
    pub fn all() -> &'static [TableKind] {
        &[
            TableKind::Poets,
            TableKind::Poems,
            TableKind::Booths,
            TableKind::Collections,
        ]
    }
}

/// Per-run state: lookup cache, row alignment and counters
struct Importer<'a> {
    config: &'a ImportConfig,
    audio: Option<&'a AudioIndex>,
    resolver: LookupResolver,
    report: RunReport,
    poets_by_row: HashMap<usize, Uuid>,
    poems_by_row: HashMap<usize, Uuid>,
    booths_by_row: HashMap<usize, Vec<Uuid>>,
}

fn count_skipped<T>(counts: &mut EntityCounts, normalized: &Normalized<T>) {
    counts.skipped += normalized.skipped.len();
}

impl<'a> Importer<'a> {
    fn new(config: &'a ImportConfig, audio: Option<&'a AudioIndex>) -> Self {
        Self {
            config,
            audio,
            resolver: LookupResolver::new(),
            report: RunReport::default(),
            poets_by_row: HashMap::new(),
            poems_by_row: HashMap::new(),
            booths_by_row: HashMap::new(),
        }
    }

    async fn link(&mut self, conn: &mut SqliteConnection, kind: LinkKind, left: Uuid, right: Uuid) -> Result<()> {
        if ensure_link(conn, kind, left, right).await? {
            log::debug!("Linked {} {} -> {}", kind, left, right);
            self.report.link_created(kind);
        }
        Ok(())
    }

    async fn run(&mut self, conn: &mut SqliteConnection, tables: &SplitTables) -> Result<()> {
        for kind in TableKind::all() {
            let Some(block) = tables.get(kind.label()) else {
                log::info!("No {} table in sheet, skipping", kind.label());
                continue;
            };

            log::info!("Importing {} ({} rows)", kind.label(), block.len());
            match kind {
                TableKind::Poets => self.import_poets(conn, block).await?,
                TableKind::Poems => self.import_poems(conn, block).await?,
                TableKind::Booths => self.import_booths(conn, block).await?,
                TableKind::Collections => self.import_collections(conn, block).await?,
            }
        }

        self.report.lookups_created = self.resolver.created().clone();
        Ok(())
    }

    async fn import_poets(&mut self, conn: &mut SqliteConnection, block: &TableBlock) -> Result<()> {
        let normalized = normalize_poets(block);
        count_skipped(&mut self.report.poets, &normalized);

        for row in &normalized.records {
            let poet = &row.record;
            let upserted = upsert_poet(conn, poet).await.with_context(|| {
                format!("Failed to import poet on sheet row {}", row.source_row + 1)
            })?;
            log::debug!(
                "{} poet {} {}",
                if upserted.created { "Created" } else { "Updated" },
                poet.legal_first_name,
                poet.legal_last_name
            );

            self.report.poets.record(upserted);
            self.poets_by_row.insert(row.source_row, upserted.id);
        }

        log::info!("Poets: {}", self.report.poets);
        Ok(())
    }

    async fn import_poems(&mut self, conn: &mut SqliteConnection, block: &TableBlock) -> Result<()> {
        let policy = self.config.poem_key;
        let normalized = normalize_poems(block, policy);
        count_skipped(&mut self.report.poems, &normalized);

        for row in &normalized.records {
            let poem = &row.record;

            let Some(&poet_id) = self.poets_by_row.get(&row.source_row) else {
                log::warn!(
                    "Skipping sheet row {}: poem has no poet on the same row",
                    row.source_row + 1
                );
                self.report.poems.skipped += 1;
                continue;
            };

            let key = match (policy, poem.telepoem_number.as_deref(), poem.title.as_deref()) {
                (PoemKeyPolicy::TelepoemNumber, Some(number), _) => PoemKey::TelepoemNumber(number),
                (PoemKeyPolicy::TitleAndPoet, _, Some(title)) => PoemKey::TitleAndPoet(title, poet_id),
                _ => {
                    log::warn!(
                        "Skipping sheet row {}: poem has no {} to match on",
                        row.source_row + 1,
                        policy.label()
                    );
                    self.report.poems.skipped += 1;
                    continue;
                }
            };

            let era_id = self
                .resolver
                .resolve_opt(conn, LookupKind::Era, poem.era.as_deref())
                .await?;
            let format = self.config.id_list_format;
            let types = self
                .resolver
                .resolve_all(conn, LookupKind::PoemType, &poem.types, ImportConfig::cap(self.config.max_poem_types))
                .await?;
            let topics = self
                .resolver
                .resolve_all(conn, LookupKind::PoemTopic, &poem.topics, ImportConfig::cap(self.config.max_poem_topics))
                .await?;
            let tags = self
                .resolver
                .resolve_all(
                    conn,
                    LookupKind::SpecialTag,
                    &poem.special_tags,
                    ImportConfig::cap(self.config.max_special_tags),
                )
                .await?;
            let languages = self
                .resolver
                .resolve_all(conn, LookupKind::Language, &poem.languages, ImportConfig::cap(self.config.max_languages))
                .await?;

            let audio_link = match (self.audio, poem.telepoem_number.as_deref()) {
                (Some(index), Some(number)) => index.link_for(number),
                _ => None,
            };
            if audio_link.is_some() {
                self.report.audio_links_matched += 1;
            }

            let fields = PoemFields {
                record: poem,
                poet_id,
                era_id,
                poem_types: join_ids(&types, format),
                poem_topics: join_ids(&topics, format),
                poem_special_tags: join_ids(&tags, format),
                language: join_ids(&languages, format),
                audio_link,
            };

            let upserted = upsert_poem(conn, key, &fields).await.with_context(|| {
                format!("Failed to import poem on sheet row {}", row.source_row + 1)
            })?;
            log::debug!(
                "{} poem by {}",
                if upserted.created { "Created" } else { "Updated" },
                key
            );
            self.report.poems.record(upserted);

            // The direct column and the link table always agree
            self.link(conn, LinkKind::PoetAndPoem, poet_id, upserted.id).await?;
            self.poems_by_row.insert(row.source_row, upserted.id);
        }

        log::info!("Poems: {}", self.report.poems);
        Ok(())
    }

    async fn import_booths(&mut self, conn: &mut SqliteConnection, block: &TableBlock) -> Result<()> {
        let normalized = normalize_booths(block);
        count_skipped(&mut self.report.booths, &normalized);

        for row in &normalized.records {
            let booth = &row.record;

            let directory_type_id = self
                .resolver
                .resolve_opt(conn, LookupKind::DirectoryType, booth.directory_type.as_deref())
                .await?;
            let booth_maintainer_id = self
                .resolver
                .resolve_opt(conn, LookupKind::BoothMaintainer, booth.maintainer_name.as_deref())
                .await?;

            let mut ids = Vec::new();
            for slot in booth.expand() {
                let phone_type_id = self
                    .resolver
                    .resolve_opt(conn, LookupKind::PhoneType, slot.phone_type)
                    .await?;
                let booth_type_id = self
                    .resolver
                    .resolve_opt(conn, LookupKind::BoothType, slot.booth_type)
                    .await?;

                let fields = BoothFields {
                    booth_name: slot.name,
                    number: slot.number,
                    phone_type_id,
                    booth_type_id,
                    directory_type_id,
                    booth_maintainer_id,
                    details: &booth.details,
                };

                let upserted = upsert_booth(conn, &fields).await.with_context(|| {
                    format!("Failed to import booth '{}' on sheet row {}", slot.name, row.source_row + 1)
                })?;
                log::debug!(
                    "{} booth {}",
                    if upserted.created { "Created" } else { "Updated" },
                    slot.name
                );
                self.report.booths.record(upserted);
                ids.push(upserted.id);
            }

            self.booths_by_row.insert(row.source_row, ids);
        }

        log::info!("Booths: {}", self.report.booths);
        Ok(())
    }

    async fn import_collections(&mut self, conn: &mut SqliteConnection, block: &TableBlock) -> Result<()> {
        let normalized = normalize_collections(block);
        count_skipped(&mut self.report.collections, &normalized);

        for row in &normalized.records {
            let collection = &row.record;
            let poem_id = self.poems_by_row.get(&row.source_row).copied();
            let booth_ids = self.booths_by_row.get(&row.source_row).cloned().unwrap_or_default();

            for name in &collection.names {
                let upserted = upsert_collection(conn, name, collection.description.as_deref())
                    .await
                    .with_context(|| {
                        format!("Failed to import collection '{}' on sheet row {}", name, row.source_row + 1)
                    })?;
                log::debug!(
                    "{} collection {}",
                    if upserted.created { "Created" } else { "Updated" },
                    name
                );
                self.report.collections.record(upserted);

                if let Some(poem_id) = poem_id {
                    self.link(conn, LinkKind::PoemCollectionAndPoem, upserted.id, poem_id)
                        .await?;
                }
                for booth_id in &booth_ids {
                    self.link(conn, LinkKind::BoothAndPoemCollection, *booth_id, upserted.id)
                        .await?;
                }
            }
        }

        log::info!("Poem collections: {}", self.report.collections);
        Ok(())
    }
}

/// Record which labels the sheet carried and which of them are importable
fn survey_tables(tables: &SplitTables, report: &mut RunReport) {
    for (name, block) in tables.iter() {
        if report.tables_found.iter().any(|found| found == name) {
            continue;
        }
        report.tables_found.push(name.to_string());

        if TableKind::from_label(name).is_none() {
            log::debug!("Ignoring unknown table '{}'", name);
            report.tables_ignored.push(name.to_string());
            continue;
        }
        if tables.count(name) > 1 {
            log::warn!("Table '{}' appears {} times, using the first", name, tables.count(name));
        }
        if block.is_none() {
            log::warn!("Table '{}' has no usable rows", name);
        }
    }
}

/// Import one sheet. All writes commit together or not at all.
pub async fn run_import(
    pool: &SqlitePool,
    grid: &Grid,
    config: &ImportConfig,
    audio: Option<&AudioIndex>,
) -> Result<RunReport> {
    let tables = split_tables(grid);
    let mut importer = Importer::new(config, audio);
    survey_tables(&tables, &mut importer.report);

    if tables.is_empty() {
        log::warn!("No tables found in sheet");
    }

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = importer.run(&mut *tx, &tables).await;
    if let Err(err) = result {
        if let Err(rollback_err) = tx.rollback().await {
            log::warn!("Rollback failed: {}", rollback_err);
        }
        return Err(err);
    }

    tx.commit().await.context("Failed to commit import")?;
    log::info!(
        "Import committed: {} lookups and {} links created",
        importer.report.lookups_total(),
        importer.report.links_total()
    );

    Ok(importer.report)
}

/// Run an import and fold any failure into the outcome
pub async fn run_import_handler(
    pool: &SqlitePool,
    grid: &Grid,
    config: &ImportConfig,
    audio: Option<&AudioIndex>,
) -> RunOutcome {
    match run_import(pool, grid, config, audio).await {
        Ok(report) => RunOutcome::succeeded(report),
        Err(err) => {
            log::error!("Import failed: {:#}", err);
            RunOutcome::failed(format!("{:#}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AudioConfig;
    use crate::db::{count_rows, memory_pool};
    use crate::sheet::{Value, load_first_sheet_from_bytes};

    const WIDTH: usize = 27;

    fn row(cells: &[(usize, &str)]) -> Vec<String> {
        let mut row = vec![String::new(); WIDTH];
        for (col, text) in cells {
            row[*col] = text.to_string();
        }
        row
    }

    /// Four tables side by side, two data rows; `city` is Jane's city
    fn fixture_rows(city: &str) -> Vec<Vec<String>> {
        vec![
            row(&[
                (0, "POET INFORMATION"),
                (7, "POEM INFORMATION"),
                (16, "BOOTH INFORMATION"),
                (25, "PoemCollection Information"),
            ]),
            row(&[
                (0, "legalName"),
                (1, "creditedName"),
                (2, "city"),
                (3, "status"),
                (4, "isLaureate"),
                (5, "poetBiography"),
                (6, "tableSeperator"),
                (7, "title"),
                (8, "telepoemNumber"),
                (9, "era"),
                (10, "types"),
                (11, "topics"),
                (12, "language"),
                (13, "recordingDuration"),
                (14, "status"),
                (15, "tableSeperator"),
                (16, "boothName"),
                (17, "boothNumber"),
                (18, "phoneType"),
                (19, "boothType"),
                (20, "directoryType"),
                (21, "boothMaintainerName"),
                (22, "zipCode"),
                (23, "active"),
                (24, "tableSeperator"),
                (25, "poemCollectionName"),
                (26, "description"),
            ]),
            row(&[
                (0, "Smith, Jane"),
                (1, "Smith, J."),
                (2, city),
                (3, "Active"),
                (4, "YES"),
                (5, "Writes about the sea."),
                (7, "Sea Song"),
                (8, "(617) 555-0100"),
                (9, "Modern"),
                (10, "Lyric, Sonnet"),
                (11, "Nature, Love, Loss, Grief"),
                (12, "English; Spanish"),
                (13, "00:05:30"),
                (14, "Active"),
                (16, "North; South; East"),
                (17, "1; 2"),
                (18, "Rotary"),
                (19, "Classic"),
                (20, "Tablet"),
                (21, "Parks Dept"),
                (22, "02134"),
                (23, "Yes"),
                (25, "Love Poems; Night"),
                (26, "Evening reading"),
            ]),
            row(&[
                (0, "(Unknown), Bradbury"),
                (7, "Rain"),
                (8, "042"),
                (9, "Modern"),
                (10, "Lyric"),
                (11, "Rain, Love"),
                (12, "English"),
                (16, "Library"),
                (17, "9"),
                (18, "Push Button"),
                (19, "Modern Booth"),
                (20, "Tablet"),
                (21, "Parks Dept"),
                (25, "Love Poems"),
            ]),
        ]
    }

    fn grid_from(rows: &[Vec<String>]) -> Grid {
        Grid::new(
            rows.iter()
                .map(|row| row.iter().map(|cell| Value::text(cell.as_str())).collect())
                .collect(),
        )
    }

    fn fixture(city: &str) -> Grid {
        grid_from(&fixture_rows(city))
    }

    const TABLES: &[&str] = &[
        "poet",
        "poem",
        "booth",
        "poem_collection",
        "era",
        "poem_topic",
        "poem_type",
        "language",
        "special_tag",
        "phone_type",
        "telepoem_booth_type",
        "directory_type",
        "booth_maintainer",
        "poet_and_poem",
        "poem_collection_and_poem",
        "booth_and_poem_collection",
    ];

    async fn table_counts(pool: &SqlitePool) -> Vec<(&'static str, i64)> {
        let mut counts = Vec::new();
        for table in TABLES {
            counts.push((*table, count_rows(pool, table).await));
        }
        counts
    }

    async fn text_column(pool: &SqlitePool, sql: &str, bind: &str) -> Option<String> {
        let (value,): (Option<String>,) = sqlx::query_as(sql).bind(bind).fetch_one(pool).await.unwrap();
        value
    }

    #[tokio::test]
    async fn test_fixture_import_counts() {
        let pool = memory_pool().await;
        let report = run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();

        let expected = vec![
            ("poet", 2),
            ("poem", 2),
            ("booth", 4),
            ("poem_collection", 2),
            ("era", 1),
            ("poem_topic", 4),
            ("poem_type", 2),
            ("language", 2),
            ("special_tag", 0),
            ("phone_type", 2),
            ("telepoem_booth_type", 2),
            ("directory_type", 1),
            ("booth_maintainer", 1),
            ("poet_and_poem", 2),
            ("poem_collection_and_poem", 3),
            ("booth_and_poem_collection", 7),
        ];
        assert_eq!(table_counts(&pool).await, expected);

        assert_eq!(report.poets.created, 2);
        assert_eq!(report.poems.created, 2);
        assert_eq!(report.booths.created, 4);
        assert_eq!(report.collections, EntityCounts { created: 2, updated: 1, skipped: 0 });
        assert_eq!(report.lookups_total(), 15);
        assert_eq!(report.links_total(), 12);
        assert_eq!(report.tables_found.len(), 4);
        assert!(report.tables_ignored.is_empty());
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let pool = memory_pool().await;
        let config = ImportConfig::default();

        run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();
        let after_first = table_counts(&pool).await;

        let report = run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();
        assert_eq!(table_counts(&pool).await, after_first);

        assert_eq!(report.poets, EntityCounts { created: 0, updated: 2, skipped: 0 });
        assert_eq!(report.poems.created, 0);
        assert_eq!(report.booths.created, 0);
        assert_eq!(report.collections.created, 0);
        assert_eq!(report.lookups_total(), 0);
        assert_eq!(report.links_total(), 0);
    }

    #[tokio::test]
    async fn test_sparse_update_across_runs() {
        let pool = memory_pool().await;
        let config = ImportConfig::default();
        let city_sql = "SELECT city FROM poet WHERE legalLastName = ?";

        run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();
        assert_eq!(text_column(&pool, city_sql, "Smith").await.as_deref(), Some("Boston"));

        run_import(&pool, &fixture(""), &config, None).await.unwrap();
        assert_eq!(text_column(&pool, city_sql, "Smith").await.as_deref(), Some("Boston"));

        run_import(&pool, &fixture("Chicago"), &config, None).await.unwrap();
        assert_eq!(text_column(&pool, city_sql, "Smith").await.as_deref(), Some("Chicago"));
    }

    #[tokio::test]
    async fn test_credited_name_without_last_keeps_stored_last() {
        let pool = memory_pool().await;
        let config = ImportConfig::default();
        let credited_sql = "SELECT creditedFirstName, creditedLastName FROM poet WHERE legalLastName = ?";

        run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();

        let mut rows = fixture_rows("Boston");
        rows[2][1] = "Jay".to_string();
        run_import(&pool, &grid_from(&rows), &config, None).await.unwrap();

        let (first, last): (Option<String>, Option<String>) = sqlx::query_as(credited_sql)
            .bind("Smith")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(first.as_deref(), Some("Jay"));
        assert_eq!(last.as_deref(), Some("Smith"));
    }

    #[tokio::test]
    async fn test_reattributed_poem_keeps_poet_column_and_links_consistent() {
        let pool = memory_pool().await;
        let config = ImportConfig::default();

        run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();
        let (bradbury,): (String,) = sqlx::query_as("SELECT id FROM poet WHERE legalFirstName = ?")
            .bind("Bradbury")
            .fetch_one(&pool)
            .await
            .unwrap();

        let mut rows = fixture_rows("Boston");
        rows[3][0] = "Doe, John".to_string();
        run_import(&pool, &grid_from(&rows), &config, None).await.unwrap();

        let (poem_id, poet_id): (String, String) =
            sqlx::query_as("SELECT id, poetId FROM poem WHERE telepoemNumber = ?")
                .bind("042")
                .fetch_one(&pool)
                .await
                .unwrap();
        let (doe,): (String,) = sqlx::query_as("SELECT id FROM poet WHERE legalLastName = ?")
            .bind("Doe")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(poet_id, doe);

        let links: Vec<(String,)> = sqlx::query_as("SELECT poetId FROM poet_and_poem WHERE poemId = ? ORDER BY poetId")
            .bind(&poem_id)
            .fetch_all(&pool)
            .await
            .unwrap();
        let mut expected = vec![(bradbury,), (doe,)];
        expected.sort();
        // The earlier attribution stays as a co-author link
        assert_eq!(links, expected);
        assert_eq!(count_rows(&pool, "poet_and_poem").await, 3);
    }

    #[tokio::test]
    async fn test_normalized_values_are_stored() {
        let pool = memory_pool().await;
        run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();

        let duration = text_column(
            &pool,
            "SELECT recordingDuration FROM poem WHERE telepoemNumber = ?",
            "6175550100",
        )
        .await;
        assert_eq!(duration.as_deref(), Some("00:05"));

        let first_name = text_column(
            &pool,
            "SELECT legalFirstName FROM poet WHERE legalLastName = ?",
            "",
        )
        .await;
        assert_eq!(first_name.as_deref(), Some("Bradbury"));

        // Blank description on the second row leaves the first one in place
        let description = text_column(
            &pool,
            "SELECT poemCollectionDescription FROM poem_collection WHERE poemCollectionName = ?",
            "Love Poems",
        )
        .await;
        assert_eq!(description.as_deref(), Some("Evening reading"));
    }

    #[tokio::test]
    async fn test_topic_cap_keeps_first_in_order() {
        let pool = memory_pool().await;
        run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();

        let stored = text_column(
            &pool,
            "SELECT poemTopics FROM poem WHERE telepoemNumber = ?",
            "6175550100",
        )
        .await
        .unwrap();

        let mut expected = Vec::new();
        for name in ["Nature", "Love", "Loss"] {
            expected.push(
                text_column(&pool, "SELECT id FROM poem_topic WHERE name = ?", name)
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(stored, expected.join(","));

        let (grief,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM poem_topic WHERE name = 'Grief'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(grief, 0);
    }

    #[tokio::test]
    async fn test_bracketed_id_lists() {
        let pool = memory_pool().await;
        let config = ImportConfig {
            id_list_format: crate::config::IdListFormat::Bracketed,
            ..Default::default()
        };
        run_import(&pool, &fixture("Boston"), &config, None).await.unwrap();

        let language = text_column(&pool, "SELECT language FROM poem WHERE telepoemNumber = ?", "042")
            .await
            .unwrap();
        assert!(language.starts_with('[') && language.ends_with(']'));
        assert!(!language.contains(','));
    }

    #[tokio::test]
    async fn test_booth_expansion_pads_with_last() {
        let pool = memory_pool().await;
        run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();

        let rotary = text_column(&pool, "SELECT id FROM phone_type WHERE name = ?", "Rotary")
            .await
            .unwrap();

        let booths: Vec<(String, Option<String>, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT boothName, number, phoneTypeId, zipCode FROM booth WHERE boothName IN ('North', 'South', 'East') ORDER BY number, boothName",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let summary: Vec<(&str, Option<&str>)> = booths
            .iter()
            .map(|(name, number, _, _)| (name.as_str(), number.as_deref()))
            .collect();
        assert_eq!(
            summary,
            vec![("North", Some("1")), ("East", Some("2")), ("South", Some("2"))]
        );
        assert!(booths.iter().all(|(_, _, phone, _)| phone.as_deref() == Some(rotary.as_str())));
        assert!(booths.iter().all(|(_, _, _, zip)| zip.as_deref() == Some("02134")));
    }

    #[tokio::test]
    async fn test_poem_poet_column_matches_link() {
        let pool = memory_pool().await;
        run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();

        let (unlinked,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM poem p
            WHERE NOT EXISTS (
                SELECT 1 FROM poet_and_poem l WHERE l.poemId = p.id AND l.poetId = p.poetId
            )
            "#,
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(unlinked, 0);
    }

    #[tokio::test]
    async fn test_failed_run_rolls_back() {
        let pool = memory_pool().await;
        sqlx::query("DROP TABLE booth_and_poem_collection")
            .execute(&pool)
            .await
            .unwrap();

        let outcome = run_import_handler(&pool, &fixture("Boston"), &ImportConfig::default(), None).await;
        assert!(!outcome.success);
        assert!(outcome.report.is_none());
        assert!(outcome.message.contains("booth_and_poem_collection"));

        for table in ["poet", "poem", "booth", "poem_collection", "era", "poet_and_poem"] {
            assert_eq!(count_rows(&pool, table).await, 0, "{} should be empty", table);
        }
    }

    #[tokio::test]
    async fn test_title_and_poet_policy() {
        let pool = memory_pool().await;
        let config = ImportConfig {
            poem_key: PoemKeyPolicy::TitleAndPoet,
            ..Default::default()
        };

        let mut rows = fixture_rows("Boston");
        rows[3][8] = String::new();
        let grid = grid_from(&rows);

        run_import(&pool, &grid, &config, None).await.unwrap();
        let report = run_import(&pool, &grid, &config, None).await.unwrap();

        assert_eq!(count_rows(&pool, "poem").await, 2);
        assert_eq!(report.poems, EntityCounts { created: 0, updated: 2, skipped: 0 });
    }

    #[tokio::test]
    async fn test_poem_without_poet_is_skipped() {
        let pool = memory_pool().await;
        let mut rows = fixture_rows("Boston");
        rows[3][0] = String::new();

        let report = run_import(&pool, &grid_from(&rows), &ImportConfig::default(), None)
            .await
            .unwrap();

        assert_eq!(report.poets.created, 1);
        assert_eq!(report.poems, EntityCounts { created: 1, updated: 0, skipped: 1 });
        // The collection on that row still links its booth
        assert_eq!(count_rows(&pool, "poem_collection_and_poem").await, 2);
        assert_eq!(count_rows(&pool, "booth_and_poem_collection").await, 7);
    }

    #[tokio::test]
    async fn test_audio_links_from_index() {
        let pool = memory_pool().await;
        let audio_config = AudioConfig {
            bucket: Some("telepoem".to_string()),
            ..Default::default()
        };
        let index = AudioIndex::new(vec!["poem/audio/042.mp3".to_string()], &audio_config);

        let report = run_import(&pool, &fixture("Boston"), &ImportConfig::default(), Some(&index))
            .await
            .unwrap();
        assert_eq!(report.audio_links_matched, 1);

        let link = text_column(&pool, "SELECT audioLink FROM poem WHERE telepoemNumber = ?", "042").await;
        assert_eq!(
            link.as_deref(),
            Some("https://telepoem.s3.amazonaws.com/poem/audio/042.mp3")
        );

        // A run without a match leaves the link alone
        run_import(&pool, &fixture("Boston"), &ImportConfig::default(), None)
            .await
            .unwrap();
        let link = text_column(&pool, "SELECT audioLink FROM poem WHERE telepoemNumber = ?", "042").await;
        assert!(link.is_some());
    }

    #[tokio::test]
    async fn test_unknown_tables_are_ignored() {
        let pool = memory_pool().await;
        let grid = Grid::from_text_rows(&[
            &["POET INFORMATION", "", "NOTES", ""],
            &["legalName", "city", "note", "tableSeperator"],
            &["Smith, Jane", "Boston", "call back", ""],
        ]);

        let report = run_import(&pool, &grid, &ImportConfig::default(), None)
            .await
            .unwrap();
        assert_eq!(report.tables_found, vec!["POET INFORMATION", "NOTES"]);
        assert_eq!(report.tables_ignored, vec!["NOTES"]);
        assert_eq!(report.poets.created, 1);
        assert_eq!(count_rows(&pool, "poem").await, 0);
    }

    #[tokio::test]
    async fn test_empty_sheet_commits_nothing() {
        let pool = memory_pool().await;
        let report = run_import(&pool, &Grid::default(), &ImportConfig::default(), None)
            .await
            .unwrap();
        assert!(report.tables_found.is_empty());
        assert_eq!(report.poets.total(), 0);
    }

    #[tokio::test]
    async fn test_workbook_end_to_end() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (r, cells) in fixture_rows("Boston").iter().enumerate() {
            for (c, text) in cells.iter().enumerate() {
                if !text.is_empty() {
                    sheet.write_string(r as u32, c as u16, text.as_str()).unwrap();
                }
            }
        }
        let bytes = workbook.save_to_buffer().unwrap();
        let grid = load_first_sheet_from_bytes(bytes).unwrap();

        let pool = memory_pool().await;
        let outcome = run_import_handler(&pool, &grid, &ImportConfig::default(), None).await;
        assert!(outcome.success, "{}", outcome.message);

        let report = outcome.report.unwrap();
        assert_eq!(report.poets.created, 2);
        assert_eq!(report.booths.created, 4);
        assert_eq!(count_rows(&pool, "booth_and_poem_collection").await, 7);
        assert_eq!(
            text_column(&pool, "SELECT telepoemNumber FROM poem WHERE title = ?", "Rain")
                .await
                .as_deref(),
            Some("042")
        );
    }
}
