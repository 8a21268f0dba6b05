//! Command line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::import::ImportCommands;
use commands::link_audio::LinkAudioCommands;
use commands::split::SplitCommands;

#[derive(Parser)]
#[command(name = "telepoem-import")]
#[command(about = "Import the Telepoem master spreadsheet into the booth database")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to <config dir>/telepoem-import/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database URL, overrides config and DATABASE_URL
    #[arg(long, global = true, value_name = "URL")]
    pub database_url: Option<String>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a master spreadsheet
    Import(ImportCommands),
    /// Show the tables detected in a spreadsheet
    Split(SplitCommands),
    /// Set audio links on stored poems from the recording listing
    LinkAudio(LinkAudioCommands),
}

/// Audio source flags shared by `import` and `link-audio`
#[derive(clap::Args, Debug, Clone, Default)]
pub struct AudioArgs {
    /// Newline-separated list of recording keys to use instead of a bucket listing
    #[arg(long, value_name = "PATH")]
    pub audio_manifest: Option<PathBuf>,

    /// Bucket to list recordings from
    #[arg(long, value_name = "NAME")]
    pub audio_bucket: Option<String>,
}

impl AudioArgs {
    /// Apply flags over the configured audio source
    pub fn apply(&self, audio: &mut crate::config::AudioConfig) {
        if let Some(manifest) = &self.audio_manifest {
            audio.manifest = Some(manifest.clone());
        }
        if let Some(bucket) = &self.audio_bucket {
            audio.bucket = Some(bucket.clone());
            // An explicit bucket wins over a configured manifest
            if self.audio_manifest.is_none() {
                audio.manifest = None;
            }
        }
    }
}
