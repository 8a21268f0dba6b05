pub mod handler;

use std::path::PathBuf;

use clap::Args;

use crate::cli::AudioArgs;
use crate::config::PoemKeyPolicy;

pub use handler::handle_import_command;

#[derive(Args, Debug)]
pub struct ImportCommands {
    /// Spreadsheet to import (.xlsx, .xls, .ods); `-` reads it from stdin
    pub file: PathBuf,

    /// How poems are matched against stored rows
    #[arg(long, value_enum)]
    pub poem_key: Option<PoemKeyPolicy>,

    #[command(flatten)]
    pub audio: AudioArgs,

    /// Skip audio link matching even if a source is configured
    #[arg(long, conflicts_with_all = ["audio_manifest", "audio_bucket"])]
    pub no_audio: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}
