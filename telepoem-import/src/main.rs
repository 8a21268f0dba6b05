mod cli;
mod config;
mod db;
mod error;
mod import;
mod sheet;

use anyhow::Result;
use clap::Parser;
use colored::*;

use cli::commands::import::handle_import_command;
use cli::commands::link_audio::handle_link_audio_command;
use cli::commands::split::handle_split_command;
use cli::{Cli, Commands};
use config::Config;

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // RUST_LOG still wins when set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    match cli.command {
        Commands::Import(args) => handle_import_command(args, config).await,
        Commands::Split(args) => handle_split_command(args),
        Commands::LinkAudio(args) => handle_link_audio_command(args, config).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
