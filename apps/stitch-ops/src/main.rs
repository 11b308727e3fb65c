//! # stitch-ops
//!
//! Operator command-line tool for Stitch POS.
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Parse arguments (clap)                                              │
//! │  2. Initialize tracing (stderr, EnvFilter)                              │
//! │  3. Load OpsConfig: defaults → config/stitch.toml → STITCH__* → --db    │
//! │  4. Open the database (migrations run unless the command is `migrate`) │
//! │  5. Run the command, print text or JSON to stdout                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//! ```bash
//! stitch-ops next-number INV
//! stitch-ops next-barcode -n 10
//! stitch-ops payout-quote --outlet BLR-01 5200
//! stitch-ops --format json daily-report --from 2026-03-01 --to 2026-03-31
//! stitch-ops --db /srv/stitch/stitch.db migrate
//! ```

mod cli;
mod commands;
mod config;
mod error;

use std::process;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use stitch_db::Database;

use crate::cli::{Cli, Command, Format};
use crate::commands::Render;
use crate::config::OpsConfig;
use crate::error::OpsResult;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    let mut config = OpsConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    debug!(?config, "Configuration loaded");

    if let Err(err) = run(&cli, &config).await {
        error!(error = %err, "Command failed");
        eprintln!("error: {err}");
        process::exit(err.exit_code() as i32);
    }

    Ok(())
}

/// Logs go to stderr so stdout stays clean for piping.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages everywhere
/// - `RUST_LOG=stitch_db=trace` - Trace the database layer only
/// - Default: `info,stitch=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stitch=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli, config: &OpsConfig) -> OpsResult<()> {
    let migrate_only = matches!(cli.command, Command::Migrate);
    let db = Database::new(config.db_config().run_migrations(!migrate_only)).await?;

    let printed = match &cli.command {
        Command::NextNumber { prefix, count } => {
            print(cli.format, &commands::next_number(&db, prefix, *count).await?)
        }
        Command::NextBarcode { count } => print(cli.format, &commands::next_barcode(&db, *count).await?),
        Command::PayoutQuote { outlet, amount } => {
            print(cli.format, &commands::payout_quote(&db, outlet, *amount).await?)
        }
        Command::DailyReport { from, to, outlets } => {
            print(cli.format, &commands::daily_report(&db, *from, *to, outlets).await?)
        }
        Command::Migrate => print(cli.format, &commands::migrate(&db).await?),
    };

    db.close().await;
    printed
}

fn print<T: Render>(format: Format, value: &T) -> OpsResult<()> {
    match format {
        Format::Text => println!("{}", value.render_text()),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
