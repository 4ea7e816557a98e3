//! Clear command
//!
//! Drops the log table and every row in it.
//!
//! # Usage
//!
//! ```bash
//! loghook clear
//! loghook clear --yes  # skip confirmation
//! ```

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;

use loghook_config::Config;
use loghook_sinks::ClickHouseHook;

use super::{sink_config, table_description};

#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Skip confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

pub async fn run(args: ClearArgs, config: &Config) -> Result<()> {
    let table = table_description(&config.table);
    let name = table.name.clone();

    println!();
    println!("{}", "loghook clear".bold().red());
    println!("{}", "─".repeat(50));
    println!("Table         {}", name.cyan());
    println!("URL           {}", config.clickhouse.url.dimmed());
    println!("{}", "─".repeat(50));
    println!();

    println!(
        "{}",
        "WARNING: This will permanently delete the table and all its rows."
            .yellow()
            .bold()
    );
    println!();

    if !args.yes {
        print!("Type '{}' to confirm: ", name.red().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if input.trim() != name {
            println!();
            println!("{}", "Aborted.".yellow());
            return Ok(());
        }
    }

    println!();

    print!("Connecting to ClickHouse... ");
    let hook = ClickHouseHook::connect(&sink_config(config), table)
        .await
        .context("failed to connect to log table")?;
    println!("{}", "✓".green());

    print!("Dropping table '{}'... ", name);
    hook.clear_table()
        .await
        .with_context(|| format!("failed to drop table '{name}'"))?;
    println!("{}", "✓".green());

    println!();
    println!("{}", format!("Table '{}' dropped.", name).green().bold());
    println!();

    Ok(())
}
