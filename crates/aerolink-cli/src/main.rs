//! Command-line interface for Aerolink.

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use aerolink_core::config::{defaults, env_vars};
use aerolink_core::PointValue;
use aerolink_devices::{
    command_topic, CommandEncoder, MessageNormalizer, OutboundMessage, SchemaRegistry,
    StateReconciler,
};
use aerolink_storage::{create_backend, ObjectTreeStore};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{FileConfig, Overrides, Settings};

/// Aerolink - state engine for networked air purifiers, heaters and humidifiers.
#[derive(Parser, Debug)]
#[command(name = "aerolink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Action to perform.
    #[command(subcommand)]
    command: Command,

    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State database path.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage backend (redb, memory).
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Device serial number.
    #[arg(short, long, global = true)]
    serial: Option<String>,

    /// Device product type.
    #[arg(long, global = true)]
    product_type: Option<String>,

    /// Temperature unit (K, C, F).
    #[arg(short, long, global = true)]
    unit: Option<String>,

    /// Verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Replay recorded device messages into the state store.
    Replay {
        /// File with one JSON message per line, or a JSON array of messages.
        #[arg(required = true)]
        file: PathBuf,
        /// Skip existence checks from the first message on.
        #[arg(long)]
        warm: bool,
    },
    /// List stored state.
    Show {
        /// Only paths starting with this prefix.
        prefix: Option<String>,
        /// Print nodes as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Encode a state change as a device command.
    Command {
        /// Semantic name of the data point (e.g. FanSpeed).
        name: String,
        /// Requested value (JSON literal or plain text).
        value: String,
    },
    /// Print the data point schema.
    Schema,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let overrides = Overrides {
        db_path: args.db.clone(),
        backend: args.backend.clone(),
        serial: args.serial.clone(),
        product_type: args.product_type.clone(),
        temperature_unit: args.unit.clone(),
    };
    let settings = Settings::resolve(file, overrides)?;
    debug!(?settings, "Resolved settings");

    match args.command {
        Command::Replay { file, warm } => run_replay(&settings, &file, warm).await,
        Command::Show { prefix, json } => {
            run_show(&settings, prefix.as_deref().unwrap_or(""), json)
        }
        Command::Command { name, value } => run_command(&settings, &name, &value),
        Command::Schema => run_schema(),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "aerolink=debug"
    } else {
        defaults::LOG_FILTER
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    if env_vars::log_json() {
        // JSON format for log collectors
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .init();
    }
}

fn open_store(settings: &Settings) -> Result<ObjectTreeStore> {
    let backend = create_backend(
        &settings.backend,
        &json!({ "path": settings.db_path.to_string_lossy() }),
    )
    .with_context(|| format!("Failed to open {} store", settings.backend))?;
    Ok(ObjectTreeStore::new(backend))
}

/// Messages from a JSON array file or a JSON-lines file.
fn read_messages(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON array in {}", path.display()));
    }

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("Invalid JSON on line {} of {}", i + 1, path.display()))
        })
        .collect()
}

async fn run_replay(settings: &Settings, file: &Path, warm: bool) -> Result<()> {
    let mut ctx = settings.device_context()?;
    let messages = read_messages(file)?;
    let store = Arc::new(open_store(settings)?);

    let normalizer = MessageNormalizer::default();
    let reconciler = Arc::new(StateReconciler::new(store));
    let timer = if warm {
        reconciler.mark_warm();
        None
    } else {
        Some(reconciler.spawn_warmup_timer(Duration::from_secs(settings.warmup_secs)))
    };

    info!(
        device = %ctx.serial(),
        product = ctx.product_name().unwrap_or("unknown"),
        messages = messages.len(),
        "Replaying messages"
    );

    let (mut applied, mut created, mut unchanged, mut unknown, mut dropped, mut failed) =
        (0, 0, 0, 0, 0, 0);
    for (i, message) in messages.iter().enumerate() {
        let normalized = match normalizer.normalize(&mut ctx, message) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(message = i + 1, error = %e, "Dropping message");
                dropped += 1;
                continue;
            }
        };
        unknown += normalized.unknown_fields.len();

        let report = reconciler.apply(&normalized.updates).await;
        applied += report.applied;
        created += report.created;
        unchanged += report.skipped;
        failed += report.failures.len();
    }

    if let Some(timer) = timer {
        timer.abort();
    }

    let device = match ctx.product_name() {
        Some(name) => format!("{} ({})", ctx.serial(), name),
        None => ctx.serial().to_string(),
    };
    println!(
        "Replayed {} messages for {}: {} updates applied ({} created), {} unchanged, {} unknown fields, {} dropped, {} failed",
        messages.len(),
        device,
        applied,
        created,
        unchanged,
        unknown,
        dropped,
        failed
    );
    Ok(())
}

fn run_show(settings: &Settings, prefix: &str, as_json: bool) -> Result<()> {
    let store = open_store(settings)?;
    let nodes = store.list(prefix)?;

    if as_json {
        let map: serde_json::Map<String, Value> = nodes
            .into_iter()
            .map(|(path, node)| -> Result<(String, Value)> {
                Ok((path.to_string(), serde_json::to_value(node)?))
            })
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if nodes.is_empty() {
        println!("No stored state.");
        return Ok(());
    }
    for (path, node) in nodes {
        let value = node
            .value
            .as_ref()
            .map(PointValue::to_string)
            .unwrap_or_else(|| "-".to_string());
        let unit = node
            .metadata
            .as_ref()
            .map(|m| m.unit.as_str())
            .unwrap_or_default();
        if unit.is_empty() {
            println!("{} = {}", path, value);
        } else {
            println!("{} = {} {}", path, value, unit);
        }
    }
    Ok(())
}

fn parse_value(raw: &str) -> PointValue {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => PointValue::from_json(&value),
        Err(_) => PointValue::String(raw.to_string()),
    }
}

fn run_command(settings: &Settings, name: &str, raw_value: &str) -> Result<()> {
    let ctx = settings.device_context()?;
    let value = parse_value(raw_value);

    let command = CommandEncoder::default().encode_command(&ctx, name, &value);
    if command.is_empty() {
        bail!("Cannot encode {} for {}", raw_value, name);
    }

    let message = OutboundMessage::state_set(command, chrono::Utc::now());
    println!("Topic: {}", command_topic(&ctx));
    println!("{}", message.to_json()?);
    Ok(())
}

fn run_schema() -> Result<()> {
    let registry = SchemaRegistry::builtin();

    println!(
        "{:<8} {:<28} {:<8} {:<6} {}",
        "CODE", "NAME", "KIND", "WRITE", "UNIT"
    );
    for d in registry.descriptors() {
        println!(
            "{:<8} {:<28} {:<8} {:<6} {}",
            d.wire_code,
            d.semantic_name,
            d.value_kind.to_string(),
            if d.writable { "yes" } else { "no" },
            d.unit
        );
    }

    println!("\nDerived points:");
    for d in registry.derived_descriptors() {
        println!("  {:<26} {}", d.semantic_name, d.description);
    }
    Ok(())
}
