//! Recording key sources and audio link matching
//!
//! Recordings are stored as `<prefix>/<telepoemNumber>.mp3`. The importer
//! only needs the list of keys that exist; it never downloads audio.

use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::config::AudioConfig;
use crate::db::repository::poems::{list_numbered_poems, set_audio_link};

/// Keys requested per listing page
const PAGE_SIZE: &str = "1000";

/// Somewhere recording keys can be listed from
#[async_trait]
pub trait AudioKeySource: Send + Sync {
    /// All keys under `prefix`
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Newline-separated key list on disk; blank lines and `#` comments are ignored
pub struct ManifestKeySource {
    path: PathBuf,
}

impl ManifestKeySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn parse(content: &str, prefix: &str) -> Vec<String> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| line.starts_with(prefix))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl AudioKeySource for ManifestKeySource {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read audio manifest: {}", self.path.display()))?;
        Ok(Self::parse(&content, prefix))
    }

    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }
}

/// Anonymous S3 `ListObjectsV2` listing of a public bucket
pub struct BucketKeySource {
    client: reqwest::Client,
    bucket: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<ObjectEntry>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ObjectEntry {
    key: String,
}

impl BucketKeySource {
    /// `endpoint` may contain `{bucket}`
    pub fn new(bucket: impl Into<String>, endpoint: &str) -> Self {
        let bucket = bucket.into();
        let endpoint = endpoint.replace("{bucket}", &bucket);
        Self {
            client: reqwest::Client::new(),
            bucket,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn parse_page(xml: &str) -> Result<ListBucketResult> {
        quick_xml::de::from_str(xml).context("Failed to parse bucket listing")
    }

    async fn fetch_page(&self, prefix: &str, token: Option<&str>) -> Result<ListBucketResult> {
        let mut query = vec![("list-type", "2"), ("prefix", prefix), ("max-keys", PAGE_SIZE)];
        if let Some(token) = token {
            query.push(("continuation-token", token));
        }

        let response = self
            .client
            .get(format!("{}/", self.endpoint))
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to list bucket '{}'", self.bucket))?
            .error_for_status()
            .with_context(|| format!("Bucket '{}' refused the listing", self.bucket))?;

        let body = response
            .text()
            .await
            .context("Failed to read bucket listing")?;
        Self::parse_page(&body)
    }
}

#[async_trait]
impl AudioKeySource for BucketKeySource {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.fetch_page(prefix, token.as_deref()).await?;
            keys.extend(page.contents.into_iter().map(|entry| entry.key));

            match page.next_continuation_token {
                Some(next) if page.is_truncated => token = Some(next),
                _ => break,
            }
        }

        Ok(keys)
    }

    fn describe(&self) -> String {
        format!("bucket {}", self.bucket)
    }
}

/// Pick the configured key source; a manifest takes precedence over a bucket
pub fn key_source(config: &AudioConfig) -> Option<Box<dyn AudioKeySource>> {
    if let Some(manifest) = &config.manifest {
        return Some(Box::new(ManifestKeySource::new(manifest)));
    }
    config
        .bucket
        .as_ref()
        .map(|bucket| Box::new(BucketKeySource::new(bucket.clone(), &config.endpoint)) as Box<dyn AudioKeySource>)
}

/// Known recording keys plus the rules for turning one into a link
#[derive(Debug, Clone)]
pub struct AudioIndex {
    keys: HashSet<String>,
    prefix: String,
    bucket: String,
    url_template: String,
}

impl AudioIndex {
    pub fn new(keys: impl IntoIterator<Item = String>, config: &AudioConfig) -> Self {
        Self {
            keys: keys.into_iter().collect(),
            prefix: config.prefix.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone().unwrap_or_default(),
            url_template: config.url_template.clone(),
        }
    }

    /// List keys from `source` and build an index
    pub async fn load(source: &dyn AudioKeySource, config: &AudioConfig) -> Result<Self> {
        log::info!("Listing audio keys from {}", source.describe());
        let keys = source.list_keys(&config.prefix).await?;
        log::info!("Found {} audio keys", keys.len());
        Ok(Self::new(keys, config))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Public link for a telepoem number, if its recording exists
    pub fn link_for(&self, telepoem_number: &str) -> Option<String> {
        let key = format!("{}/{}.mp3", self.prefix, telepoem_number);
        if !self.keys.contains(&key) {
            return None;
        }

        Some(
            self.url_template
                .replace("{bucket}", &self.bucket)
                .replace("{key}", &key),
        )
    }
}

/// Load the configured audio index, or `None` when no source is configured
pub async fn load_audio_index(config: &AudioConfig) -> Result<Option<AudioIndex>> {
    match key_source(config) {
        Some(source) => Ok(Some(AudioIndex::load(source.as_ref(), config).await?)),
        None => {
            log::debug!("No audio source configured, skipping audio links");
            Ok(None)
        }
    }
}

/// Set audio links on every stored poem whose recording exists.
///
/// Runs in one transaction; poems without a match keep their current link.
/// Returns the number of poems linked.
pub async fn backfill_audio_links(pool: &SqlitePool, index: &AudioIndex) -> Result<usize> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let poems = list_numbered_poems(&mut *tx).await?;
    let mut linked = 0;
    for (id, number) in &poems {
        if let Some(link) = index.link_for(number) {
            set_audio_link(&mut *tx, *id, &link).await?;
            log::debug!("Linked audio for poem {}", number);
            linked += 1;
        }
    }

    tx.commit().await.context("Failed to commit audio links")?;
    log::info!("Linked audio for {} of {} poems", linked, poems.len());
    Ok(linked)
}
