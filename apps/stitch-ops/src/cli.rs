//! Command-line surface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use stitch_core::Money;

use crate::config::DEFAULT_CONFIG_PATH;

/// Back-office tool for Stitch POS outlets.
#[derive(Debug, Parser)]
#[command(name = "stitch-ops", version, about)]
pub struct Cli {
    /// Config file; missing file means defaults.
    #[arg(long, short, env = "STITCH_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Database file, overriding the configured path.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Text, global = true)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Issue document numbers for a prefix (INV, CRN, TRF, CONWS, ...).
    NextNumber {
        prefix: String,

        /// How many numbers to issue.
        #[arg(long, short = 'n', default_value_t = 1)]
        count: u32,
    },

    /// Issue shelf barcodes.
    NextBarcode {
        #[arg(long, short = 'n', default_value_t = 1)]
        count: u32,
    },

    /// Show the payout an amount would earn at an outlet.
    PayoutQuote {
        /// Outlet code or id.
        #[arg(long)]
        outlet: String,

        /// Sale amount, e.g. 5200 or 5200.50.
        amount: Money,
    },

    /// Day-wise sales register for a date range.
    DailyReport {
        /// First day, YYYY-MM-DD.
        #[arg(long)]
        from: NaiveDate,

        /// Last day, inclusive. Defaults to `from`.
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Restrict to these outlets (code or id). Repeatable; all outlets
        /// when omitted.
        #[arg(long = "outlet")]
        outlets: Vec<String>,
    },

    /// Apply pending schema migrations.
    Migrate,
}
