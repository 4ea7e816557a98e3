//! Diagnostic logging setup
//!
//! One `fmt` layer (console or JSON) filtered by the resolved level, plus a
//! reloadable slot for the [`HookLayer`] that forwards application events to
//! ClickHouse. The `fmt` layer is installed before the sink connects so its
//! startup diagnostics are visible; the hook is attached through the returned
//! [`HookHandle`] once it exists. The level filter only applies to the `fmt`
//! layer; the hook sees every event its levels accept.

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use loghook_config::{LogConfig, LogFormat, LogOutput};
use loghook_sinks::{Hook, HookLayer};
use tracing::Subscriber;
use tracing_subscriber::filter::Filtered;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::Layered;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*, reload};

/// Hook layer slot; empty until a hook is attached
pub type HookSlot = Option<HookLayer<Arc<dyn Hook>>>;

type FmtLayer = Filtered<Box<dyn Layer<Registry> + Send + Sync>, EnvFilter, Registry>;

/// Handle for attaching (or detaching) the hook layer after startup
pub type HookHandle = reload::Handle<HookSlot, Layered<FmtLayer, Registry>>;

/// Install the global subscriber with an empty hook slot
pub fn init(config: &LogConfig, level: &str) -> Result<HookHandle> {
    let (subscriber, handle) = build(config, level)?;
    subscriber
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(handle)
}

/// Put `layer` into the running subscriber's hook slot
pub fn attach(handle: &HookHandle, layer: HookLayer<Arc<dyn Hook>>) -> Result<()> {
    handle
        .reload(Some(layer))
        .context("failed to attach hook layer")
}

fn build(
    config: &LogConfig,
    level: &str,
) -> Result<(impl Subscriber + Send + Sync + 'static, HookHandle)> {
    let filter = EnvFilter::try_new(LogConfig::directive_for(level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let (writer, ansi) = make_writer(&config.output)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Console => fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
    };

    let (hook_slot, handle) = reload::Layer::new(HookSlot::None);
    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(hook_slot);

    Ok((subscriber, handle))
}

/// Writer for the configured output; ANSI colors only on terminal streams
fn make_writer(output: &LogOutput) -> Result<(BoxMakeWriter, bool)> {
    match output {
        LogOutput::Stdout => Ok((BoxMakeWriter::new(std::io::stdout), true)),
        LogOutput::Stderr => Ok((BoxMakeWriter::new(std::io::stderr), true)),
        LogOutput::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {path}"))?;
            Ok((BoxMakeWriter::new(Mutex::new(file)), false))
        }
    }
}
