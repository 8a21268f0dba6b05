//! Spreadsheet-to-database import pipeline

pub mod audio;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod report;
pub mod resolver;

pub use audio::{AudioIndex, backfill_audio_links, load_audio_index};
pub use pipeline::{TableKind, run_import, run_import_handler};
pub use report::{EntityCounts, RunOutcome, RunReport};
