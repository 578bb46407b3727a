//! Console and JSON reporting. Purely presentational: formatting
//! functions build strings, thin wrappers print them, and the full
//! metric set (plans included) lands in one JSON artifact.

use std::fs;
use std::path::Path;

use crate::error::{HarnessError, Result};
use crate::models::{QueryBenchmark, ReportDocument, RowCounts, RunReport};

// ---

const RULE: &str = "==================================================";

/// Print everything collected during one pass.
pub fn print_run(label: &str, report: &RunReport) {
    // ---
    println!("\nRun: {label}");
    println!("{RULE}");
    print!("{}", row_count_block(&report.row_counts));
    print!("{}", latency_table(&report.benchmark_results));
    print!("{}", performance_summary(&report.benchmark_results));
}

/// Print the with/without-dimension comparison when both passes ran.
pub fn print_comparison(document: &ReportDocument) {
    if let Some(table) = comparison_table(document) {
        print!("{table}");
    }
}

/// Serialize the full report document (plans included) to pretty JSON.
pub fn write_json(path: &Path, document: &ReportDocument) -> Result<()> {
    // ---
    let json = serde_json::to_string_pretty(document).map_err(|e| HarnessError::Report {
        path: path.to_path_buf(),
        source: e.into(),
    })?;

    fs::write(path, json).map_err(|source| HarnessError::Report {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!("Wrote report to {}", path.display());
    Ok(())
}

// ---

fn row_count_block(counts: &RowCounts) -> String {
    // ---
    let mut out = String::new();
    out.push_str("\nRow Counts:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "\"Values\" table: {} rows\n",
        format_count(counts.values_table)
    ));
    out.push_str(&format!(
        "Daily rollup:   {} rows\n",
        format_count(counts.daily_rollup)
    ));
    out.push_str(&format!(
        "Monthly rollup: {} rows\n",
        format_count(counts.monthly_rollup)
    ));
    out
}

fn latency_table(results: &[QueryBenchmark]) -> String {
    // ---
    let mut out = String::new();
    out.push_str("\nBenchmark results:\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "{:<28} {:>10} {:>10} {:>10} {:>8}\n",
        "Query", "avg (ms)", "min (ms)", "max (ms)", "rows"
    ));
    for r in results {
        out.push_str(&format!(
            "{:<28} {:>10.2} {:>10.2} {:>10.2} {:>8}\n",
            r.query, r.avg_ms, r.min_ms, r.max_ms, r.result_count
        ));
    }
    out
}

/// Queries sorted by ascending average latency, fastest first.
fn performance_summary(results: &[QueryBenchmark]) -> String {
    // ---
    let mut sorted: Vec<&QueryBenchmark> = results.iter().collect();
    sorted.sort_by(|a, b| a.avg_ms.total_cmp(&b.avg_ms));

    let mut out = String::new();
    out.push_str("\nPerformance Summary:\n");
    out.push_str(RULE);
    out.push('\n');
    for r in sorted {
        out.push_str(&format!("{}: {:.2} ms\n", r.query, r.avg_ms));
    }
    out
}

/// Side-by-side average latencies per query, keyed on the two run labels.
/// Returns `None` unless both passes are present.
fn comparison_table(document: &ReportDocument) -> Option<String> {
    // ---
    let with = document.get("with_dimension")?;
    let without = document.get("without_dimension")?;

    let mut out = String::new();
    out.push_str("\nDimension comparison (avg ms):\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "{:<28} {:>12} {:>12}\n",
        "Query", "with dim", "without dim"
    ));
    for r in &with.benchmark_results {
        let other = without
            .benchmark_results
            .iter()
            .find(|o| o.query == r.query);
        match other {
            Some(o) => out.push_str(&format!(
                "{:<28} {:>12.2} {:>12.2}\n",
                r.query, r.avg_ms, o.avg_ms
            )),
            None => out.push_str(&format!("{:<28} {:>12.2} {:>12}\n", r.query, r.avg_ms, "-")),
        }
    }
    Some(out)
}

/// Thousands-separated integer, e.g. `1234567` -> `1,234,567`.
fn format_count(n: i64) -> String {
    // ---
    let raw = n.abs().to_string();
    let mut grouped = String::with_capacity(raw.len() + raw.len() / 3);
    for (i, c) in raw.chars().enumerate() {
        if i > 0 && (raw.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::LatencyStats;

    fn bench(query: &str, avg_ms: f64) -> QueryBenchmark {
        QueryBenchmark::new(
            query,
            LatencyStats {
                avg_ms,
                min_ms: avg_ms,
                max_ms: avg_ms,
            },
            12,
            String::new(),
        )
    }

    fn sample_report() -> RunReport {
        RunReport {
            benchmark_results: vec![bench("Raw Query (Daily)", 40.0), bench("Using Daily Rollup", 4.0)],
            row_counts: RowCounts {
                values_table: 1_234_567,
                daily_rollup: 4_380,
                monthly_rollup: 144,
            },
        }
    }

    #[test]
    fn thousands_grouping() {
        // ---
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
        assert_eq!(format_count(-12_345), "-12,345");
    }

    #[test]
    fn row_counts_render_all_three_sources() {
        // ---
        let block = row_count_block(&sample_report().row_counts);
        assert!(block.contains("\"Values\" table: 1,234,567 rows"));
        assert!(block.contains("Daily rollup:   4,380 rows"));
        assert!(block.contains("Monthly rollup: 144 rows"));
    }

    #[test]
    fn summary_sorts_fastest_first() {
        // ---
        let summary = performance_summary(&sample_report().benchmark_results);
        let rollup = summary.find("Using Daily Rollup").unwrap();
        let raw = summary.find("Raw Query (Daily)").unwrap();
        assert!(rollup < raw);
    }

    #[test]
    fn latency_table_lists_every_query() {
        // ---
        let table = latency_table(&sample_report().benchmark_results);
        assert!(table.contains("Raw Query (Daily)"));
        assert!(table.contains("Using Daily Rollup"));
        assert!(table.contains("avg (ms)"));
    }

    #[test]
    fn comparison_needs_both_passes() {
        // ---
        let mut document = ReportDocument::new();
        document.insert("with_dimension".to_string(), sample_report());
        assert!(comparison_table(&document).is_none());

        document.insert("without_dimension".to_string(), sample_report());
        let table = comparison_table(&document).unwrap();
        assert!(table.contains("with dim"));
        assert!(table.contains("Raw Query (Daily)"));
    }

    #[test]
    fn json_artifact_round_trips_from_disk() {
        // ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("benchmark_results.json");

        let mut document = ReportDocument::new();
        document.insert("without_dimension".to_string(), sample_report());
        write_json(&path, &document).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let back: ReportDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            back["without_dimension"].row_counts.values_table,
            1_234_567
        );
    }
}
