//! Synthetic series population for the fact hypertable.
//!
//! One hourly series per (device, tag) pair over the configured history
//! window, values drawn server-side with `random()`. Rows are produced by
//! the database itself from `generate_series`, one statement per device
//! batch, so a 3-year default run (300 devices x 50 tags x ~26k hours)
//! never round-trips individual rows.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{HarnessError, Result};

// ---

/// Devices per INSERT statement. Bounds statement work and server memory;
/// each statement still covers every tag and the full time span.
pub const DEVICE_BATCH_SIZE: usize = 10;

const INSERT_SERIES: &str = r#"
INSERT INTO public."Values" ("Date", "Tag", "Device", "Value")
SELECT gs."Date", tag."Tag", dev."Device", random() AS "Value"
FROM generate_series($1::timestamptz, $2::timestamptz, INTERVAL '1 hour') AS gs("Date")
CROSS JOIN unnest($3::text[]) AS tag("Tag")
CROSS JOIN unnest($4::text[]) AS dev("Device")
"#;

// ---

/// Populate the fact table for `devices` x `tags` hourly series over
/// `[start, end]` inclusive. Returns the number of rows inserted.
///
/// An empty or inverted span inserts nothing. Uniqueness of
/// (Tag, Device, Date) holds by construction: each pair owns a disjoint
/// generated series.
pub async fn populate(
    pool: &PgPool,
    devices: u32,
    tags: u32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<u64> {
    // ---
    if start >= end || devices == 0 || tags == 0 {
        tracing::info!("Nothing to generate (empty span or zero devices/tags)");
        return Ok(0);
    }

    let tag_labels = labels("TAG", 0, tags);
    let device_labels = labels("DEVICE", 0, devices);

    tracing::info!(
        "Generating {} series of {} hourly rows each ({} .. {})",
        device_labels.len() * tag_labels.len(),
        hourly_rows_per_series(start, end),
        start,
        end
    );

    let mut inserted = 0u64;
    for batch in device_labels.chunks(DEVICE_BATCH_SIZE) {
        let result = sqlx::query(INSERT_SERIES)
            .bind(start)
            .bind(end)
            .bind(&tag_labels)
            .bind(batch)
            .execute(pool)
            .await
            .map_err(HarnessError::query("populate"))?;

        inserted += result.rows_affected();
        tracing::debug!(
            "Inserted batch up to {} ({} rows so far)",
            batch.last().map(String::as_str).unwrap_or("-"),
            inserted
        );
    }

    tracing::info!("Inserted {inserted} rows");
    Ok(inserted)
}

/// `PREFIX_{i}` labels for `i` in `[from, to)`.
pub fn labels(prefix: &str, from: u32, to: u32) -> Vec<String> {
    (from..to).map(|i| format!("{prefix}_{i}")).collect()
}

/// Rows one (device, tag) series contributes over `[start, end]` at an
/// hourly step, both boundaries included. Empty and inverted spans
/// contribute nothing.
pub fn hourly_rows_per_series(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    // ---
    if start >= end {
        return 0;
    }
    (end - start).num_hours() + 1
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn one_day_span_yields_25_hourly_rows() {
        // Hour 0 of day 1 through hour 0 of day 2, boundaries inclusive.
        assert_eq!(
            hourly_rows_per_series(date(2023, 1, 1), date(2023, 1, 2)),
            25
        );
    }

    #[test]
    fn empty_span_yields_no_rows() {
        // ---
        assert_eq!(hourly_rows_per_series(date(2023, 1, 1), date(2023, 1, 1)), 0);
        // Inverted ranges are treated the same way.
        assert_eq!(hourly_rows_per_series(date(2023, 1, 2), date(2023, 1, 1)), 0);
    }

    #[test]
    fn one_year_span_row_count() {
        // ---
        // 2022 is not a leap year: 365 * 24 hours plus the closing boundary.
        assert_eq!(
            hourly_rows_per_series(date(2022, 1, 1), date(2023, 1, 1)),
            365 * 24 + 1
        );
    }

    #[test]
    fn label_formatting() {
        // ---
        assert_eq!(labels("TAG", 0, 3), vec!["TAG_0", "TAG_1", "TAG_2"]);
        assert_eq!(labels("DEVICE", 1, 3), vec!["DEVICE_1", "DEVICE_2"]);
        assert!(labels("TAG", 0, 0).is_empty());
    }

    #[test]
    fn devices_split_into_fixed_batches() {
        // ---
        let devices = labels("DEVICE", 0, 300);
        let batches: Vec<_> = devices.chunks(DEVICE_BATCH_SIZE).collect();
        assert_eq!(batches.len(), 30);
        assert!(batches.iter().all(|b| b.len() == DEVICE_BATCH_SIZE));

        // A ragged tail stays in its own final batch.
        let devices = labels("DEVICE", 0, 25);
        let batches: Vec<_> = devices.chunks(DEVICE_BATCH_SIZE).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn insert_goes_through_generate_series() {
        // ---
        assert!(INSERT_SERIES.contains("generate_series"));
        assert!(INSERT_SERIES.contains("INTERVAL '1 hour'"));
        assert!(INSERT_SERIES.contains("unnest($3::text[])"));
        assert!(INSERT_SERIES.contains("random()"));
    }
}
