//! k8sflag: watch a config volume and report flag values.
//!
//! Reads a TOML manifest declaring flags, registers each one against the
//! watched root, and prints the current values as a JSON line whenever
//! they change.
//!
//! ```text
//! manifest.toml ──▶ FlagSet ──▶ flags ──▶ periodic snapshot ──▶ stdout
//!                      ▲
//!                      └── notify events from the config directory
//! ```
//!
//! Exit codes: 0 on Ctrl-C or `--once`, 1 when a required flag cannot be
//! loaded, 2 when the manifest is invalid.

use clap::Parser;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use k8sflag::config::loader::load_manifest;
use k8sflag::config::validation::{typed_default, TypedDefault, ValidationError};
use k8sflag::config::FlagSpec;
use k8sflag::observability::{logging, metrics};
use k8sflag::{FlagOptions, FlagSet};

#[derive(Parser)]
#[command(name = "k8sflag")]
#[command(about = "Report live values of file-backed configuration flags", long_about = None)]
struct Cli {
    /// Flag manifest (TOML).
    #[arg(short, long)]
    manifest: PathBuf,

    /// Override the manifest's watch root.
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// How often to check for changed values, in milliseconds.
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Print the initial values and exit.
    #[arg(long)]
    once: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(cli.log_json);

    let mut manifest = match load_manifest(&cli.manifest) {
        Ok(manifest) => manifest,
        Err(e) => {
            tracing::error!(manifest = %cli.manifest.display(), error = %e, "Invalid manifest");
            eprintln!("k8sflag: {e}");
            std::process::exit(2);
        }
    };
    if let Some(root) = cli.root {
        manifest.watch.root = root;
    }

    if let Some(addr) = cli.metrics_addr {
        metrics::init_metrics(addr);
    }

    let set = FlagSet::with_config(manifest.watch.clone())?;
    for spec in &manifest.flags {
        register(&set, spec)?;
    }
    tracing::info!(flags = manifest.flags.len(), root = %set.root().display(), "Flags registered");

    let mut last = snapshot_json(&set);
    println!("{last}");
    if cli.once {
        set.close();
        return Ok(());
    }

    let mut ticker = tokio::time::interval(Duration::from_millis(cli.interval_ms.max(1)));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let current = snapshot_json(&set);
                if current != last {
                    println!("{current}");
                    last = current;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, shutting down");
                break;
            }
        }
    }

    set.close();
    Ok(())
}

/// Register one manifest entry. Required flags that cannot be loaded
/// terminate the process from inside the constructor.
fn register(set: &FlagSet, spec: &FlagSpec) -> Result<(), ValidationError> {
    let mut options = FlagOptions::new();
    if spec.required {
        options = options.required();
    }
    match spec.dynamic {
        Some(true) => options = options.dynamic(),
        Some(false) => options = options.static_value(),
        None => {}
    }

    match typed_default(spec)? {
        TypedDefault::String(d) => {
            set.string(&spec.name, d, options);
        }
        TypedDefault::Bool(d) => {
            set.bool(&spec.name, d, options);
        }
        TypedDefault::Int(d) => {
            set.int(&spec.name, d, options);
        }
        TypedDefault::Duration(d) => {
            set.duration(&spec.name, d, options);
        }
    }
    Ok(())
}

fn snapshot_json(set: &FlagSet) -> String {
    let values: Map<String, Value> = set
        .snapshot()
        .into_iter()
        .map(|(name, value)| (name, Value::String(value)))
        .collect();
    Value::Object(values).to_string()
}
