use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use finance_history::config::AppConfig;
use finance_history::interval::SharedClock;
use finance_history::ledger::{Ledger, RecordKind};
use finance_history::telemetry::init_tracing;
use mockable::DefaultClock;

/// Inspect the versioned finance records held by a freshly built ledger.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// YAML or JSON config file, defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current version of every record of a kind
    Show { kind: RecordKind },
    /// Print every version of one record, oldest first
    History { kind: RecordKind, id: i64 },
    /// Print the change journal of a kind
    Journal { kind: RecordKind },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::default(),
    };
    init_tracing(&config)?;

    let clock: SharedClock = Arc::new(DefaultClock);
    let ledger = Ledger::from_config(&config, clock).context("building ledger")?;
    tracing::debug!(?config, "ledger ready");

    let output = match cli.command {
        Command::Show { kind } => serde_json::to_string_pretty(&ledger.current_json(kind)?)?,
        Command::History { kind, id } => {
            serde_json::to_string_pretty(&ledger.history_json(kind, id)?)?
        }
        Command::Journal { kind } => serde_json::to_string_pretty(&ledger.journal(kind)?)?,
    };
    println!("{output}");

    Ok(())
}
