use anyhow::Result;
use colored::*;

use super::SplitCommands;
use crate::import::TableKind;
use crate::sheet::{find_table_spans, load_first_sheet, split_tables, write_blocks_excel};

/// Handle `split`: list detected tables and optionally export them
pub fn handle_split_command(args: SplitCommands) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Spreadsheet does not exist: {}", args.file.display());
    }

    let grid = load_first_sheet(&args.file)?;
    println!(
        "{} ({} rows x {} columns)",
        args.file.display().to_string().cyan(),
        grid.height(),
        grid.width()
    );

    let spans = find_table_spans(&grid);
    if spans.is_empty() {
        println!("{}", "No tables found".yellow());
        return Ok(());
    }

    let tables = split_tables(&grid);
    for (span, (_, block)) in spans.iter().zip(tables.iter()) {
        let known = if TableKind::from_label(&span.name).is_some() {
            "".normal()
        } else {
            " (ignored by import)".dimmed()
        };

        match block {
            Some(block) => println!(
                "  {} columns {}..{}: {} columns, {} rows{}",
                span.name.bold(),
                span.columns.start,
                span.columns.end,
                block.headers.len(),
                block.len(),
                known
            ),
            None => println!(
                "  {} columns {}..{}: {}{}",
                span.name.bold(),
                span.columns.start,
                span.columns.end,
                "empty".yellow(),
                known
            ),
        }
    }

    if let Some(output) = &args.output {
        let written = write_blocks_excel(&tables, output)?;
        println!(
            "{} Wrote {} tables to {}",
            "✓".green().bold(),
            written,
            output.display()
        );
    }

    Ok(())
}
