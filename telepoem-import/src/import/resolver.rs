//! Get-or-create resolution of lookup names with an in-run cache

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::config::IdListFormat;
use crate::db::repository::lookups::{LookupKind, find_lookup_id, insert_lookup};

/// Resolves lookup names to ids for one run.
///
/// The cache only ever holds ids that exist inside the current transaction,
/// so a resolver must not outlive the run it was created for.
#[derive(Debug, Default)]
pub struct LookupResolver {
    cache: HashMap<(LookupKind, String), Uuid>,
    created: BTreeMap<LookupKind, usize>,
}

impl LookupResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve one name, creating the row on first sight. Blank names resolve to `None`.
    pub async fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        kind: LookupKind,
        name: &str,
    ) -> Result<Option<Uuid>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let key = (kind, name.to_string());
        if let Some(id) = self.cache.get(&key) {
            return Ok(Some(*id));
        }

        let id = match find_lookup_id(conn, kind, name).await? {
            Some(id) => id,
            None => {
                let id = insert_lookup(conn, kind, name).await?;
                log::debug!("Created {} '{}'", kind, name);
                *self.created.entry(kind).or_default() += 1;
                id
            }
        };

        self.cache.insert(key, id);
        Ok(Some(id))
    }

    /// Resolve an optional name
    pub async fn resolve_opt(
        &mut self,
        conn: &mut SqliteConnection,
        kind: LookupKind,
        name: Option<&str>,
    ) -> Result<Option<Uuid>> {
        match name {
            Some(name) => self.resolve(conn, kind, name).await,
            None => Ok(None),
        }
    }

    /// Resolve every name in order, keeping at most `cap` of them
    pub async fn resolve_all(
        &mut self,
        conn: &mut SqliteConnection,
        kind: LookupKind,
        names: &[String],
        cap: Option<usize>,
    ) -> Result<Vec<Uuid>> {
        let kept = match cap {
            Some(cap) if names.len() > cap => {
                log::warn!(
                    "Keeping the first {} of {} {} values, dropping: {}",
                    cap,
                    names.len(),
                    kind,
                    names[cap..].join(", ")
                );
                &names[..cap]
            }
            _ => names,
        };

        let mut ids = Vec::with_capacity(kept.len());
        for name in kept {
            if let Some(id) = self.resolve(conn, kind, name).await? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Lookup rows created so far, per kind
    pub fn created(&self) -> &BTreeMap<LookupKind, usize> {
        &self.created
    }
}

/// Serialize resolved ids for storage on a poem; an empty list stays unset
pub fn join_ids(ids: &[Uuid], format: IdListFormat) -> Option<String> {
    if ids.is_empty() {
        return None;
    }

    let joined = ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",");
    Some(match format {
        IdListFormat::Comma => joined,
        IdListFormat::Bracketed => format!("[{}]", joined),
    })
}
