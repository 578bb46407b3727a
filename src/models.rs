//! Report records collected over one benchmark run.
//!
//! Everything here is ephemeral: built in memory while the pipeline runs,
//! printed by `report` and serialized into the JSON artifact. Nothing is
//! ever written back to the database.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---

/// Wall-clock latency summary over the timed executions of one query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatencyStats {
    // ---
    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
}

impl LatencyStats {
    /// Summarize raw millisecond samples. Returns `None` for an empty slice.
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        // ---
        if samples.is_empty() {
            return None;
        }

        let mut min_ms = f64::INFINITY;
        let mut max_ms = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for &s in samples {
            min_ms = min_ms.min(s);
            max_ms = max_ms.max(s);
            sum += s;
        }

        Some(LatencyStats {
            avg_ms: sum / samples.len() as f64,
            min_ms,
            max_ms,
        })
    }
}

/// Outcome of benchmarking a single query variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryBenchmark {
    // ---
    /// Human-readable variant label, e.g. `Using Daily Rollup`.
    pub query: String,

    pub avg_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,

    /// Row cardinality of the final timed execution.
    pub result_count: usize,

    /// Full `EXPLAIN ANALYZE` output for the variant.
    pub explain_plan: String,
}

impl QueryBenchmark {
    pub fn new(query: &str, stats: LatencyStats, result_count: usize, explain_plan: String) -> Self {
        // ---
        QueryBenchmark {
            query: query.to_string(),
            avg_ms: stats.avg_ms,
            min_ms: stats.min_ms,
            max_ms: stats.max_ms,
            result_count,
            explain_plan,
        }
    }
}

/// `COUNT(*)` snapshot of the fact table and both rollup views.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowCounts {
    // ---
    pub values_table: i64,
    pub daily_rollup: i64,
    pub monthly_rollup: i64,
}

/// Everything collected during one pass of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    // ---
    pub benchmark_results: Vec<QueryBenchmark>,
    pub row_counts: RowCounts,
}

/// The on-disk artifact: one entry per pass, keyed by run label
/// (`with_dimension` / `without_dimension`).
pub type ReportDocument = BTreeMap<String, RunReport>;

// ---

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn stats_from_samples() {
        // ---
        let stats = LatencyStats::from_samples(&[4.0, 2.0, 9.0]).unwrap();
        assert_eq!(stats.min_ms, 2.0);
        assert_eq!(stats.max_ms, 9.0);
        assert_eq!(stats.avg_ms, 5.0);
    }

    #[test]
    fn stats_single_sample() {
        // ---
        let stats = LatencyStats::from_samples(&[7.5]).unwrap();
        assert_eq!(stats.min_ms, 7.5);
        assert_eq!(stats.max_ms, 7.5);
        assert_eq!(stats.avg_ms, 7.5);
    }

    #[test]
    fn stats_empty_is_none() {
        // ---
        assert!(LatencyStats::from_samples(&[]).is_none());
    }

    #[test]
    fn report_document_json_shape() {
        // ---
        let report = RunReport {
            benchmark_results: vec![QueryBenchmark::new(
                "Using Daily Rollup",
                LatencyStats {
                    avg_ms: 1.5,
                    min_ms: 1.0,
                    max_ms: 2.0,
                },
                365,
                "Seq Scan on values_daily_rollup".to_string(),
            )],
            row_counts: RowCounts {
                values_table: 100,
                daily_rollup: 10,
                monthly_rollup: 1,
            },
        };

        let mut document = ReportDocument::new();
        document.insert("with_dimension".to_string(), report);

        let json = serde_json::to_value(&document).unwrap();
        let run = &json["with_dimension"];
        assert_eq!(run["row_counts"]["values_table"], 100);
        assert_eq!(run["benchmark_results"][0]["query"], "Using Daily Rollup");
        assert_eq!(run["benchmark_results"][0]["result_count"], 365);
        assert!(run["benchmark_results"][0]["explain_plan"]
            .as_str()
            .unwrap()
            .contains("Seq Scan"));
    }

    #[test]
    fn report_document_round_trips() {
        // ---
        let mut document = ReportDocument::new();
        document.insert(
            "without_dimension".to_string(),
            RunReport {
                benchmark_results: vec![],
                row_counts: RowCounts {
                    values_table: 0,
                    daily_rollup: 0,
                    monthly_rollup: 0,
                },
            },
        );

        let json = serde_json::to_string(&document).unwrap();
        let back: ReportDocument = serde_json::from_str(&json).unwrap();
        assert!(back.contains_key("without_dimension"));
        assert_eq!(back["without_dimension"].row_counts.values_table, 0);
    }
}
