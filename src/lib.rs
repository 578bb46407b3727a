//! TimescaleDB rollup benchmark harness.
//!
//! Rebuilds a synthetic device/tag hypertable from scratch, layers two
//! continuous-aggregate rollups on top, and times four equivalent
//! daily-aggregation query variants against each other. The pipeline for
//! one pass is strictly sequential:
//!
//! schema -> populate -> continuous aggregates -> row counts -> benchmarks
//!
//! `compare` mode runs the whole pipeline twice, with and without a
//! secondary hash partition dimension on the device column, against a
//! fresh connection per pass.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub mod bench;
pub mod config;
pub mod error;
pub mod generate;
pub mod models;
pub mod report;
pub mod schema;

pub use config::{Config, RunMode};
pub use error::{HarnessError, Result};

use models::RunReport;

// ---

/// Open the connection pool for one pass.
///
/// Capped at a single connection: the run is strictly sequential and the
/// pool only manages lifecycle, never concurrency.
pub async fn connect(conn_string: &str) -> Result<PgPool> {
    // ---
    PgPoolOptions::new()
        .max_connections(1)
        .connect(conn_string)
        .await
        .map_err(HarnessError::Connection)
}

/// The generation window: January 1 of (current year - `years`) through
/// January 1 of the current year, hourly.
pub fn generation_window(now: DateTime<Utc>, years: u32) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    // ---
    let end_year = now.year();
    let start_year = end_year - years as i32;

    let start = Utc
        .with_ymd_and_hms(start_year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| HarnessError::Config(format!("invalid history start year {start_year}")))?;
    let end = Utc
        .with_ymd_and_hms(end_year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| HarnessError::Config(format!("invalid history end year {end_year}")))?;

    Ok((start, end))
}

/// Run one full pass of the pipeline and collect its report.
pub async fn run_pass(pool: &PgPool, cfg: &Config, with_dimension: bool) -> Result<RunReport> {
    // ---
    let (start, end) = generation_window(Utc::now(), cfg.years)?;

    schema::create_schema(pool, with_dimension, cfg.partitions).await?;
    generate::populate(pool, cfg.devices, cfg.tags, start, end).await?;
    schema::create_continuous_aggregates(pool).await?;

    let row_counts = schema::row_counts(pool).await?;

    let (from, to) = bench::last_full_year_window(end)?;
    let params = bench::BenchParams {
        devices: bench::test_devices(cfg.test_devices),
        tag: bench::pick_tag(cfg.tags),
        from,
        to,
    };
    let benchmark_results = bench::run_all(pool, &params, cfg.iterations).await?;

    Ok(RunReport {
        benchmark_results,
        row_counts,
    })
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generation_window_spans_whole_years() {
        // ---
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 0).unwrap();
        let (start, end) = generation_window(now, 3).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn zero_years_is_an_empty_window() {
        // ---
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 0, 0, 0).unwrap();
        let (start, end) = generation_window(now, 0).unwrap();
        assert_eq!(start, end);
        assert_eq!(generate::hourly_rows_per_series(start, end), 0);
    }
}
