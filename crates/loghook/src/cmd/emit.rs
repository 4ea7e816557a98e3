//! Emit command - send demo log entries through the ClickHouse hook
//!
//! Attaches the hook layer to the running subscriber, logs `--count` entries carrying `id` and
//! `log_id` fields, waits for every insert and prints the outcome.
//!
//! # Usage
//!
//! ```bash
//! loghook emit              # 100 entries
//! loghook emit --count 5
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use owo_colors::OwoColorize;

use loghook_config::Config;
use loghook_sinks::{ClickHouseHook, Hook, HookLayer};

use super::{sink_config, table_description};
use crate::logging::{self, HookHandle};

/// Target of the demo events; forwarded to the hook
const DEMO_TARGET: &str = "loghook::demo";

#[derive(Args, Debug)]
pub struct EmitArgs {
    /// Number of entries to emit
    #[arg(short = 'n', long, default_value = "100")]
    pub count: u32,
}

pub async fn run(args: EmitArgs, config: &Config, hook_handle: &HookHandle) -> Result<()> {
    let table = table_description(&config.table);
    let name = table.name.clone();

    let hook = ClickHouseHook::connect(&sink_config(config), table)
        .await
        .with_context(|| format!("failed to set up hook for table '{name}'"))?;
    let hook = Arc::new(hook);

    let layer = HookLayer::new(Arc::clone(&hook) as Arc<dyn Hook>)
        .with_fixed_fields(config.fields.clone());
    logging::attach(hook_handle, layer)?;

    for i in 0..args.count {
        tracing::info!(
            target: DEMO_TARGET,
            id = i,
            log_id = %format!("log_{i}"),
            "loghook-demo-{}",
            i
        );
    }

    hook.flush().await;
    let metrics = hook.shutdown().await;

    println!();
    println!("{}", "loghook emit".bold());
    println!("{}", "─".repeat(50));
    println!("Table         {}", name.cyan());
    println!("Delivered     {}", metrics.rows_delivered);
    println!("Inserted      {}", metrics.rows_inserted.green());
    if metrics.rows_lost() > 0 {
        println!("Lost          {}", metrics.rows_lost().red());
    }
    println!("{}", "─".repeat(50));
    println!();

    if metrics.rows_lost() > 0 {
        println!(
            "{}",
            "Some rows were dropped; see the error log above.".yellow()
        );
        println!();
    }

    Ok(())
}
