//! Benchmark runner: four daily-aggregation query variants over the same
//! device subset, tag, and date range, each captured under
//! `EXPLAIN ANALYZE` and then executed repeatedly under wall-clock timing.
//!
//! The harness never cross-checks the variants against each other at run
//! time; they are compared for speed, and their agreement is asserted by
//! the integration suite instead.

use std::time::Instant;

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rand::Rng;
use sqlx::PgPool;

use crate::error::{HarnessError, Result};
use crate::generate::labels;
use crate::models::{LatencyStats, QueryBenchmark};

// ---

/// Filter parameters shared by all four query variants.
#[derive(Debug, Clone)]
pub struct BenchParams {
    // ---
    pub devices: Vec<String>,
    pub tag: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// One benchmark query: display label plus parameterized SQL
/// (`$1` device array, `$2` tag, `$3`/`$4` inclusive date range).
struct QueryVariant {
    label: &'static str,
    sql: &'static str,
}

const VARIANTS: &[QueryVariant] = &[
    QueryVariant {
        label: "Raw Query (Daily)",
        sql: r#"
SELECT
    DATE_TRUNC('day', t."Date") AS "Time",
    COALESCE(SUM(t."Value"), 0.0) AS "Value"
FROM public."Values" AS t
WHERE t."Device" = ANY ($1)
AND t."Tag" = $2
AND t."Date" >= $3
AND t."Date" <= $4
GROUP BY DATE_TRUNC('day', t."Date")
ORDER BY "Time"
"#,
    },
    QueryVariant {
        label: "Using time_bucket (Daily)",
        sql: r#"
SELECT
    time_bucket('1 day', "Date") AS "Time",
    COALESCE(SUM("Value"), 0.0) AS "Value"
FROM public."Values"
WHERE "Device" = ANY ($1)
AND "Tag" = $2
AND "Date" >= $3
AND "Date" <= $4
GROUP BY "Time"
ORDER BY "Time"
"#,
    },
    QueryVariant {
        label: "Using Daily Rollup",
        sql: r#"
SELECT
    bucket AS "Time",
    COALESCE(SUM(sum_value), 0.0) AS "Value"
FROM values_daily_rollup
WHERE "Device" = ANY ($1)
AND "Tag" = $2
AND bucket >= $3
AND bucket <= $4
GROUP BY bucket
ORDER BY bucket
"#,
    },
    QueryVariant {
        label: "Using Monthly Rollup",
        sql: r#"
SELECT
    bucket AS "Time",
    COALESCE(SUM(sum_value), 0.0) AS "Value"
FROM values_monthly_rollup
WHERE "Device" = ANY ($1)
AND "Tag" = $2
AND bucket >= $3
AND bucket <= $4
GROUP BY bucket
ORDER BY bucket
"#,
    },
];

// ---

/// Run every variant: plan inspection first, then `iterations` timed
/// executions recording min/avg/max latency and the final row count.
pub async fn run_all(
    pool: &PgPool,
    params: &BenchParams,
    iterations: u32,
) -> Result<Vec<QueryBenchmark>> {
    // ---
    let iterations = iterations.max(1);
    let mut results = Vec::with_capacity(VARIANTS.len());

    for variant in VARIANTS {
        tracing::info!("Benchmarking: {}", variant.label);

        let plan = explain_analyze(pool, variant, params).await?;
        tracing::debug!("{} plan:\n{}", variant.label, plan);

        let mut samples = Vec::with_capacity(iterations as usize);
        let mut result_count = 0usize;
        for _ in 0..iterations {
            let started = Instant::now();
            let rows = sqlx::query(variant.sql)
                .bind(&params.devices)
                .bind(&params.tag)
                .bind(params.from)
                .bind(params.to)
                .fetch_all(pool)
                .await
                .map_err(HarnessError::query("benchmark"))?;
            samples.push(started.elapsed().as_secs_f64() * 1000.0);
            result_count = rows.len();
        }

        let stats =
            LatencyStats::from_samples(&samples).expect("at least one timed iteration runs");
        tracing::info!(
            "{}: avg {:.2} ms over {} rows",
            variant.label,
            stats.avg_ms,
            result_count
        );
        results.push(QueryBenchmark::new(
            variant.label,
            stats,
            result_count,
            plan,
        ));
    }

    Ok(results)
}

/// Capture `EXPLAIN ANALYZE` output for one variant.
///
/// Utility statements cannot be prepared with bind parameters, so the
/// statement is rendered with quoted literals and sent over the simple
/// protocol.
async fn explain_analyze(
    pool: &PgPool,
    variant: &QueryVariant,
    params: &BenchParams,
) -> Result<String> {
    // ---
    use sqlx::Row;

    let rendered = format!("EXPLAIN ANALYZE {}", render_literals(variant.sql, params));
    let rows = sqlx::raw_sql(&rendered)
        .fetch_all(pool)
        .await
        .map_err(HarnessError::query("explain"))?;

    let mut plan = String::new();
    for row in rows {
        let line: String = row.try_get(0).map_err(HarnessError::query("explain"))?;
        plan.push_str(&line);
        plan.push('\n');
    }
    Ok(plan)
}

// ---

/// Labels and SQL of every benchmark variant, in execution order.
pub fn variant_queries() -> Vec<(&'static str, &'static str)> {
    VARIANTS.iter().map(|v| (v.label, v.sql)).collect()
}

/// Benchmark device subset: `DEVICE_1 ..= DEVICE_{count}`.
pub fn test_devices(count: u32) -> Vec<String> {
    labels("DEVICE", 1, count + 1)
}

/// Pick one generated tag label uniformly at random.
pub fn pick_tag(tag_count: u32) -> String {
    // ---
    let idx = if tag_count <= 1 {
        0
    } else {
        rand::rng().random_range(0..tag_count)
    };
    format!("TAG_{idx}")
}

/// The last fully generated calendar year before `end`: January 1
/// through December 31 23:59:59.
pub fn last_full_year_window(end: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    // ---
    let year = end.year() - 1;
    let from = Utc
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| HarnessError::Config(format!("invalid benchmark year {year}")))?;
    let to = Utc
        .with_ymd_and_hms(year, 12, 31, 23, 59, 59)
        .single()
        .ok_or_else(|| HarnessError::Config(format!("invalid benchmark year {year}")))?;
    Ok((from, to))
}

/// Substitute the bind placeholders with safely quoted literals, for the
/// plan-inspection pass only.
fn render_literals(sql: &str, params: &BenchParams) -> String {
    // ---
    let devices = params
        .devices
        .iter()
        .map(|d| quote_literal(d))
        .collect::<Vec<_>>()
        .join(",");

    sql.replace("$1", &format!("ARRAY[{devices}]"))
        .replace("$2", &quote_literal(&params.tag))
        .replace("$3", &quote_literal(&params.from.to_rfc3339()))
        .replace("$4", &quote_literal(&params.to.to_rfc3339()))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

// ---
