//! Run summary

use std::collections::BTreeMap;

use serde::Serialize;

use crate::db::repository::Upserted;
use crate::db::repository::links::LinkKind;
use crate::db::repository::lookups::LookupKind;

/// Per-entity outcome counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EntityCounts {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl EntityCounts {
    pub fn record(&mut self, upserted: Upserted) {
        if upserted.created {
            self.created += 1;
        } else {
            self.updated += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.created + self.updated
    }
}

impl std::fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} skipped",
            self.created, self.updated, self.skipped
        )
    }
}

/// What one import run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub poets: EntityCounts,
    pub poems: EntityCounts,
    pub booths: EntityCounts,
    pub collections: EntityCounts,
    pub lookups_created: BTreeMap<LookupKind, usize>,
    pub links_created: BTreeMap<LinkKind, usize>,
    pub audio_links_matched: usize,
    /// Table labels found in the sheet, in sheet order
    pub tables_found: Vec<String>,
    /// Labels that are not importable tables
    pub tables_ignored: Vec<String>,
}

impl RunReport {
    pub fn link_created(&mut self, kind: LinkKind) {
        *self.links_created.entry(kind).or_default() += 1;
    }

    pub fn lookups_total(&self) -> usize {
        self.lookups_created.values().sum()
    }

    pub fn links_total(&self) -> usize {
        self.links_created.values().sum()
    }
}

/// Result handed back to callers that must not see an error
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub success: bool,
    pub message: String,
    pub report: Option<RunReport>,
}

impl RunOutcome {
    pub fn succeeded(report: RunReport) -> Self {
        Self {
            success: true,
            message: "Data Added".to_string(),
            report: Some(report),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            report: None,
        }
    }
}
