//! # Operator Configuration
//!
//! Settings for `stitch-ops`, loaded once at startup.
//!
//! ## Configuration Sources (later wins)
//! 1. Defaults (this file)
//! 2. Config file (`config/stitch.toml`, optional)
//! 3. Environment variables (`STITCH__SECTION__KEY`)
//! 4. Command-line flags (`--db`)
//!
//! ```text
//! STITCH__DATABASE__PATH=/srv/stitch/stitch.db
//! STITCH__TAX__MODE=exclusive
//! STITCH__BARCODE__STRATEGY=latest_row
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use stitch_core::numbering::DEFAULT_PAD_WIDTH;
use stitch_core::{BarcodeStrategy, TaxMode, DEFAULT_MAX_REPORT_DAYS};
use stitch_db::DbConfig;

use crate::error::OpsResult;

/// Default location of the config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/stitch.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "STITCH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpsConfig {
    pub database: DatabaseSection,
    pub numbering: NumberingSection,
    pub tax: TaxSection,
    pub barcode: BarcodeSection,
    pub report: ReportSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    /// SQLite file, created on first use.
    pub path: PathBuf,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a writer waits for the lock before failing.
    pub busy_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingSection {
    /// Pad width for counters of prefixes outside the known families.
    pub default_pad_width: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSection {
    pub mode: TaxMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeSection {
    pub strategy: BarcodeStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Longest accepted report range, in days.
    pub max_days: i64,
}

impl Default for OpsConfig {
    fn default() -> Self {
        OpsConfig {
            database: DatabaseSection {
                path: PathBuf::from("./stitch.db"),
                max_connections: 5,
                min_connections: 1,
                busy_timeout_secs: 5,
            },
            numbering: NumberingSection {
                default_pad_width: DEFAULT_PAD_WIDTH,
            },
            tax: TaxSection {
                mode: TaxMode::Inclusive,
            },
            barcode: BarcodeSection {
                strategy: BarcodeStrategy::Counter,
            },
            report: ReportSection {
                max_days: DEFAULT_MAX_REPORT_DAYS,
            },
        }
    }
}

impl OpsConfig {
    /// Loads defaults, then the file at `path` if it exists, then the
    /// environment.
    pub fn load(path: &Path) -> OpsResult<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: &Path, env: Environment) -> OpsResult<Self> {
        let loaded = Config::builder()
            .add_source(Config::try_from(&OpsConfig::default())?)
            .add_source(File::from(path).required(false))
            .add_source(
                env.prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<OpsConfig>()?;

        Ok(loaded)
    }

    /// Database connection settings for [`stitch_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .min_connections(self.database.min_connections)
            .busy_timeout(Duration::from_secs(self.database.busy_timeout_secs))
            .default_pad_width(self.numbering.default_pad_width)
            .tax_mode(self.tax.mode)
            .barcode_strategy(self.barcode.strategy)
            .max_report_days(self.report.max_days)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
