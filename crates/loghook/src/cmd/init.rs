//! Init command
//!
//! Validates the `[table]` description and creates the table.
//!
//! # Usage
//!
//! ```bash
//! loghook init
//! loghook init --dry-run   # print the DDL without connecting
//! ```

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;

use loghook_config::Config;
use loghook_sinks::ClickHouseHook;
use loghook_sinks::clickhouse::schema;

use super::{sink_config, table_description};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Print the CREATE TABLE statement without executing it
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn run(args: InitArgs, config: &Config) -> Result<()> {
    let table = table_description(&config.table);

    println!();
    println!("{}", "loghook init".bold());
    println!("{}", "─".repeat(50));
    println!("Table         {}", table.name.cyan());
    println!("Engine        {}", table.engine);
    println!("URL           {}", config.clickhouse.url.dimmed());
    println!("{}", "─".repeat(50));
    println!();

    table
        .validate()
        .context("invalid [table] section in config")?;

    if args.dry_run {
        println!("{}", "[DRY RUN] Would execute:".yellow().bold());
        println!();
        println!("{}", schema::create_table_statement(&table).sql());
        println!();
        return Ok(());
    }

    print!("Creating table '{}'... ", table.name);
    let hook = ClickHouseHook::connect(&sink_config(config), table)
        .await
        .context("failed to set up log table")?;
    println!("{}", "✓".green());

    println!();
    println!(
        "{}",
        format!("Table '{}' is ready.", hook.table().name)
            .green()
            .bold()
    );
    println!();

    Ok(())
}
