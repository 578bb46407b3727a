//! Binary entry point for the `rollup-bench` harness.
//!
//! Orchestrates the full run:
//! - Loading configuration from CLI flags, environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Opening a fresh single-connection pool per pass
//! - Rebuilding the hypertable schema and synthetic data set
//! - Timing the four benchmark query variants
//! - Printing the comparison tables and writing the JSON artifact
//!
//! # Environment Variables
//! - `DATABASE_URL` – PostgreSQL connection string (unless `--conn-string`)
//! - `DEVICE_COUNT`, `TAG_COUNT`, `HISTORY_YEARS` (optional) – data set size
//! - `BENCH_LOG_LEVEL` (optional) – log verbosity (default: `info`)
//! - `BENCH_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! Any failure is logged and terminates the process with exit code 1; all
//! classification of what went wrong lives in the library's typed errors.

use std::{env, io::IsTerminal};

use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use anyhow::Result;

use rollup_bench::models::ReportDocument;
use rollup_bench::{config, report};

// ---

#[tokio::main]
async fn main() {
    // ---
    init_tracing();
    dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // ---
    let matches = config::cli().get_matches();
    let cfg = config::load(&matches)?;
    cfg.log_config();

    let mut document = ReportDocument::new();
    for pass in cfg.mode.passes() {
        tracing::info!("Starting pass: {}", pass.label);
        tracing::info!(
            "Attempting to connect to database: {}",
            config::mask_conn_string(&cfg.conn_string)
        );

        let pool = rollup_bench::connect(&cfg.conn_string).await?;
        tracing::info!("Successfully connected to database");

        let pass_report = rollup_bench::run_pass(&pool, &cfg, pass.with_dimension).await?;
        pool.close().await;

        report::print_run(pass.label, &pass_report);
        document.insert(pass.label.to_string(), pass_report);
    }

    report::print_comparison(&document);
    report::write_json(&cfg.output, &document)?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `BENCH_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `BENCH_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("BENCH_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to BENCH_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("BENCH_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "info",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
