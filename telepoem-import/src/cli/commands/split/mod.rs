pub mod handler;

use std::path::PathBuf;

use clap::Args;

pub use handler::handle_split_command;

#[derive(Args, Debug)]
pub struct SplitCommands {
    /// Spreadsheet to inspect
    pub file: PathBuf,

    /// Write every detected block to its own worksheet in this workbook
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
