//! Typed error model for the benchmark harness.
//!
//! Component functions classify their failures here instead of deciding
//! process fate themselves; only `main` maps an error to an exit code.

use std::path::PathBuf;

use thiserror::Error;

// ---

#[derive(Debug, Error)]
pub enum HarnessError {
    /// A CLI flag or environment variable could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The initial database connection could not be established.
    #[error("failed to connect to database: {0}")]
    Connection(#[source] sqlx::Error),

    /// A statement failed after the connection was up. `stage` names the
    /// pipeline step (schema, populate, aggregates, benchmark, counts).
    #[error("query failed during {stage}: {source}")]
    Query {
        stage: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The JSON artifact could not be written.
    #[error("failed to write report to {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HarnessError {
    pub fn query(stage: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |source| HarnessError::Query { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, HarnessError>;

// ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_names_its_stage() {
        // ---
        let err = HarnessError::query("schema")(sqlx::Error::PoolClosed);
        assert!(err.to_string().contains("schema"));
    }

    #[test]
    fn config_error_carries_message() {
        // ---
        let err = HarnessError::Config("DEVICE_COUNT: not a number".into());
        assert!(err.to_string().contains("DEVICE_COUNT"));
    }
}
