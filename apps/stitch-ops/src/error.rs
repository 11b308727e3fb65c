//! # Operator Errors
//!
//! Everything a command can fail with, mapped to a process exit code.
//!
//! ```text
//! ConfigError ─┐
//! DbError ─────┼──► OpsError ──► main: log, print, exit(code)
//! CoreError ───┘
//! ```

use stitch_core::CoreError;
use stitch_db::DbError;

pub type OpsResult<T> = Result<T, OpsError>;

#[derive(Debug, thiserror::Error)]
pub enum OpsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// No outlet matches the code or id given on the command line.
    #[error("Unknown outlet: {0}")]
    UnknownOutlet(String),

    #[error("Could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Bad input from the operator.
    Usage = 2,
    /// Referenced record does not exist.
    NotFound = 3,
    /// Database unavailable or a query failed.
    Database = 4,
    /// A business rule refused the operation.
    Rejected = 5,
    Internal = 70,
}

impl OpsError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            OpsError::Config(_) => ExitCode::Usage,
            OpsError::UnknownOutlet(_) => ExitCode::NotFound,
            OpsError::Core(e) | OpsError::Db(DbError::Domain(e)) => core_exit_code(e),
            OpsError::Db(DbError::NotFound { .. }) => ExitCode::NotFound,
            OpsError::Db(DbError::UniqueViolation { .. }) => ExitCode::Usage,
            OpsError::Db(_) => ExitCode::Database,
            OpsError::Output(_) => ExitCode::Internal,
        }
    }
}

fn core_exit_code(err: &CoreError) -> ExitCode {
    match err {
        CoreError::Validation(_) | CoreError::InvalidDateRange { .. } => ExitCode::Usage,
        _ => ExitCode::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_core::ValidationError;

    #[test]
    fn test_exit_codes() {
        let invalid = OpsError::from(DbError::Domain(CoreError::Validation(
            ValidationError::Required {
                field: "prefix".to_string(),
            },
        )));
        assert_eq!(invalid.exit_code(), ExitCode::Usage);

        let missing = OpsError::UnknownOutlet("DEL-09".to_string());
        assert_eq!(missing.exit_code(), ExitCode::NotFound);
        assert_eq!(missing.to_string(), "Unknown outlet: DEL-09");

        let db = OpsError::from(DbError::PoolExhausted);
        assert_eq!(db.exit_code(), ExitCode::Database);
    }
}
