//! Database schema management for the benchmark harness.
//!
//! Provisions the `public."Values"` fact hypertable and its two
//! continuous-aggregate rollups from scratch on every pass: unconditional
//! drops followed by guarded creates, so repeated invocations always
//! leave exactly one table and two views with no leftover data.

use sqlx::PgPool;

use crate::error::{HarnessError, Result};
use crate::models::RowCounts;

// ---

const DROP_SCHEMA: &str = r#"
DROP MATERIALIZED VIEW IF EXISTS values_daily_rollup CASCADE;
DROP MATERIALIZED VIEW IF EXISTS values_monthly_rollup CASCADE;
DROP TABLE IF EXISTS public."Values" CASCADE;
"#;

const CREATE_VALUES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS public."Values"
(
    "Date" timestamptz NOT NULL,
    "Tag" TEXT NOT NULL,
    "Device" TEXT NOT NULL,
    "Value" double precision NOT NULL,
    CONSTRAINT "PK_Values" PRIMARY KEY ("Tag", "Device", "Date")
);
"#;

const CREATE_HYPERTABLE: &str =
    r#"SELECT create_hypertable('public."Values"', by_range('Date', INTERVAL '1 month'));"#;

const DAILY_ROLLUP: &str = r#"
CREATE MATERIALIZED VIEW IF NOT EXISTS values_daily_rollup
WITH (timescaledb.continuous) AS
SELECT time_bucket('1 day', "Date") AS bucket,
       "Tag",
       "Device",
       SUM("Value") as sum_value
FROM public."Values"
GROUP BY bucket, "Tag", "Device"
WITH DATA;
"#;

const MONTHLY_ROLLUP: &str = r#"
CREATE MATERIALIZED VIEW IF NOT EXISTS values_monthly_rollup
WITH (timescaledb.continuous) AS
SELECT time_bucket('1 month', "Date") AS bucket,
       "Tag",
       "Device",
       SUM("Value") as sum_value
FROM public."Values"
GROUP BY bucket, "Tag", "Device"
WITH DATA;
"#;

// ---

/// Drop and recreate the fact hypertable (idempotent).
///
/// The table is range-partitioned on `"Date"` with one-month chunks. When
/// `secondary_dimension` is set, a hash dimension over `"Device"` with
/// `partitions` partitions is added on top, which is the variable the
/// comparative benchmark passes flip.
///
/// Errors are propagated if any DDL statement fails.
pub async fn create_schema(
    pool: &PgPool,
    secondary_dimension: bool,
    partitions: u16,
) -> Result<()> {
    // ---
    let mut tx = pool.begin().await.map_err(HarnessError::query("schema"))?;

    sqlx::raw_sql(DROP_SCHEMA)
        .execute(&mut *tx)
        .await
        .map_err(HarnessError::query("schema"))?;

    sqlx::raw_sql(CREATE_VALUES_TABLE)
        .execute(&mut *tx)
        .await
        .map_err(HarnessError::query("schema"))?;

    sqlx::raw_sql(CREATE_HYPERTABLE)
        .execute(&mut *tx)
        .await
        .map_err(HarnessError::query("schema"))?;

    if secondary_dimension {
        tracing::info!("Adding hash dimension on \"Device\" ({partitions} partitions)");
        let add_dimension = format!(
            r#"SELECT add_dimension('public."Values"', 'Device', number_partitions => {partitions});"#
        );
        sqlx::raw_sql(&add_dimension)
            .execute(&mut *tx)
            .await
            .map_err(HarnessError::query("schema"))?;
    }

    tx.commit().await.map_err(HarnessError::query("schema"))?;
    Ok(())
}

/// Create the daily and monthly continuous aggregates, fully materialized.
///
/// TimescaleDB refuses `CREATE MATERIALIZED VIEW .. timescaledb.continuous`
/// inside a transaction block, so each statement runs autocommit on its
/// own simple-protocol round trip.
pub async fn create_continuous_aggregates(pool: &PgPool) -> Result<()> {
    // ---
    tracing::info!("Creating daily continuous aggregate");
    sqlx::raw_sql(DAILY_ROLLUP)
        .execute(pool)
        .await
        .map_err(HarnessError::query("aggregates"))?;

    tracing::info!("Creating monthly continuous aggregate");
    sqlx::raw_sql(MONTHLY_ROLLUP)
        .execute(pool)
        .await
        .map_err(HarnessError::query("aggregates"))?;

    Ok(())
}

/// `COUNT(*)` over the fact table and both rollup views.
pub async fn row_counts(pool: &PgPool) -> Result<RowCounts> {
    // ---
    let values_table = count(pool, r#"SELECT COUNT(*) FROM public."Values""#).await?;
    let daily_rollup = count(pool, "SELECT COUNT(*) FROM values_daily_rollup").await?;
    let monthly_rollup = count(pool, "SELECT COUNT(*) FROM values_monthly_rollup").await?;

    Ok(RowCounts {
        values_table,
        daily_rollup,
        monthly_rollup,
    })
}

async fn count(pool: &PgPool, query: &str) -> Result<i64> {
    sqlx::query_scalar(query)
        .fetch_one(pool)
        .await
        .map_err(HarnessError::query("counts"))
}

// ---
