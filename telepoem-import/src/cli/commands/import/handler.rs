//! Import command handler

use std::io::Read;

use anyhow::{Context, Result};
use colored::*;

use super::ImportCommands;
use crate::config::Config;
use crate::db;
use crate::import::{EntityCounts, RunOutcome, RunReport, load_audio_index, run_import_handler};
use crate::sheet::{Grid, load_first_sheet, load_first_sheet_from_bytes};

fn load_grid(args: &ImportCommands) -> Result<Grid> {
    if args.file.as_os_str() == "-" {
        let mut bytes = Vec::new();
        std::io::stdin()
            .read_to_end(&mut bytes)
            .context("Failed to read spreadsheet from stdin")?;
        if bytes.is_empty() {
            anyhow::bail!("No spreadsheet data on stdin");
        }
        return load_first_sheet_from_bytes(bytes);
    }

    if !args.file.exists() {
        anyhow::bail!("Spreadsheet does not exist: {}", args.file.display());
    }
    load_first_sheet(&args.file)
}

/// Handle `import`
pub async fn handle_import_command(args: ImportCommands, mut config: Config) -> Result<()> {
    if let Some(policy) = args.poem_key {
        config.import.poem_key = policy;
    }
    args.audio.apply(&mut config.audio);
    config.validate()?;

    // Workbook and audio problems surface before the database is touched
    let grid = load_grid(&args)?;
    let audio = if args.no_audio {
        None
    } else {
        load_audio_index(&config.audio).await?
    };

    let pool = db::connect(&config.database_url).await?;
    log::info!(
        "Importing {} (poems matched by {})",
        args.file.display(),
        config.import.poem_key.label()
    );

    let outcome = run_import_handler(&pool, &grid, &config.import, audio.as_ref()).await;
    pool.close().await;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("Failed to format JSON output")?;
        println!("{}", json);
    } else {
        print_outcome(&outcome);
    }

    if !outcome.success {
        anyhow::bail!("Import failed, no changes were committed");
    }
    Ok(())
}

fn print_outcome(outcome: &RunOutcome) {
    match &outcome.report {
        Some(report) => {
            println!("{} {}", "✓".green().bold(), outcome.message.green());
            print_report(report);
        }
        None => println!("{} {}", "✗".red().bold(), outcome.message.red()),
    }
}

fn print_counts(label: &str, counts: &EntityCounts) {
    println!(
        "  {:<18} {} created, {} updated, {}",
        label.bold(),
        counts.created.to_string().green(),
        counts.updated.to_string().cyan(),
        if counts.skipped > 0 {
            format!("{} skipped", counts.skipped).yellow()
        } else {
            "0 skipped".dimmed()
        }
    );
}

fn print_report(report: &RunReport) {
    println!();
    println!("{}", "Records".bold().underline());
    print_counts("Poets", &report.poets);
    print_counts("Poems", &report.poems);
    print_counts("Booths", &report.booths);
    print_counts("Poem collections", &report.collections);

    if !report.lookups_created.is_empty() {
        println!();
        println!("{}", "New lookup values".bold().underline());
        for (kind, count) in &report.lookups_created {
            println!("  {:<18} {}", kind.label(), count.to_string().green());
        }
    }

    if !report.links_created.is_empty() {
        println!();
        println!("{}", "New links".bold().underline());
        for (kind, count) in &report.links_created {
            println!("  {:<26} {}", kind.table(), count.to_string().green());
        }
    }

    if report.audio_links_matched > 0 {
        println!();
        println!("Audio links matched: {}", report.audio_links_matched.to_string().green());
    }

    if !report.tables_ignored.is_empty() {
        println!();
        println!(
            "{} {}",
            "Ignored tables:".yellow(),
            report.tables_ignored.join(", ").dimmed()
        );
    }
}
