use anyhow::Result;
use colored::*;

use super::LinkAudioCommands;
use crate::config::Config;
use crate::db;
use crate::import::{backfill_audio_links, load_audio_index};

/// Handle `link-audio`
pub async fn handle_link_audio_command(args: LinkAudioCommands, mut config: Config) -> Result<()> {
    args.audio.apply(&mut config.audio);
    config.validate()?;

    let Some(index) = load_audio_index(&config.audio).await? else {
        anyhow::bail!(
            "No audio source configured; pass --audio-bucket or --audio-manifest, or set audio.bucket in the config"
        );
    };

    if index.is_empty() {
        println!("{}", "No recordings found, nothing to link".yellow());
        return Ok(());
    }

    let pool = db::connect(&config.database_url).await?;
    let linked = backfill_audio_links(&pool, &index).await?;
    pool.close().await;

    println!(
        "{} Linked audio for {} poems ({} recordings listed)",
        "✓".green().bold(),
        linked.to_string().green(),
        index.len()
    );
    Ok(())
}
