use chrono::{NaiveDate, NaiveDateTime};

use super::text::{COMMA_LIST, SEMICOLON_LIST, normalize_duration, sanitize_telepoem_number};
use super::{BlockView, Normalized};
use crate::config::PoemKeyPolicy;
use crate::import::records::PoemRecord;
use crate::sheet::{BlockRow, TableBlock, Value};

const RENAMES: &[(&str, &str)] = &[
    ("status", "active"),
    ("era", "poemEra"),
    ("types", "poemTypes"),
    ("specialTags", "poemSpecialTags"),
    ("topics", "poemTopics"),
    ("isChildrenPoem", "isChildrensPoem"),
];

const FIELDS: &[&str] = &[
    "title",
    "telepoemNumber",
    "poemEra",
    "poemTypes",
    "poemTopics",
    "poemSpecialTags",
    "language",
    "image",
    "producerName",
    "narratorName",
    "recordingDate",
    "recordingSource",
    "recordingDuration",
    "optionalLegal",
    "copyRights",
    "poemText",
    "active",
    "isChildrensPoem",
    "isAdultPoem",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S"];

fn parse_recording_date(view: &BlockView<'_>, row: &BlockRow) -> Option<NaiveDate> {
    let raw = match view.value(row, "recordingDate") {
        Value::DateTime(dt) => return Some(dt.date()),
        other => other.to_text()?,
    };

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&raw, fmt).ok())
                .map(|dt| dt.date())
        });

    if parsed.is_none() {
        log::warn!(
            "Sheet row {}: unparseable recording date '{}', leaving it blank",
            row.source_row + 1,
            raw
        );
    }
    parsed
}

/// Normalize the poem block.
///
/// Rows missing the field `policy` matches on are skipped; the poet link is
/// checked later against the poet block.
pub fn normalize_poems(block: &TableBlock, policy: PoemKeyPolicy) -> Normalized<PoemRecord> {
    let view = BlockView::new(block, RENAMES, FIELDS);
    let mut out = Normalized::default();

    for row in view.rows() {
        let record = PoemRecord {
            title: view.text(row, "title"),
            telepoem_number: view
                .text(row, "telepoemNumber")
                .and_then(|raw| sanitize_telepoem_number(&raw)),
            era: view.text(row, "poemEra"),
            types: view.list(row, "poemTypes", COMMA_LIST),
            topics: view.list(row, "poemTopics", COMMA_LIST),
            special_tags: view.list(row, "poemSpecialTags", COMMA_LIST),
            languages: view.list(row, "language", SEMICOLON_LIST),
            image: view.text(row, "image"),
            producer_name: view.text(row, "producerName"),
            narrator_name: view.text(row, "narratorName"),
            recording_date: parse_recording_date(&view, row),
            recording_source: view.text(row, "recordingSource"),
            recording_duration: view
                .text(row, "recordingDuration")
                .and_then(|raw| normalize_duration(&raw)),
            optional_legal: view.text(row, "optionalLegal"),
            copy_rights: view.text(row, "copyRights"),
            poem_text: view.text(row, "poemText"),
            active: view.flag(row, "active", &["active"]),
            is_childrens_poem: view.flag(row, "isChildrensPoem", &["yes"]),
            is_adult_poem: view.flag(row, "isAdultPoem", &["yes"]),
        };

        match policy {
            PoemKeyPolicy::TelepoemNumber if record.telepoem_number.is_none() => {
                out.skip(row, "poem has no telepoem number");
            }
            PoemKeyPolicy::TitleAndPoet if record.title.is_none() => {
                out.skip(row, "poem has no title");
            }
            _ => out.push(row, record),
        }
    }

    out
}
