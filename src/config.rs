//! Run configuration for the benchmark harness.
//!
//! This module centralizes all runtime configuration values and their
//! defaults. Values come from CLI flags first, then environment variables
//! (with optional `.env` file support provided by the caller), then
//! built-in defaults. By consolidating the logic here we avoid scattering
//! `env::var` calls and `ArgMatches` lookups throughout the codebase.

use std::env;
use std::path::PathBuf;

use clap::{Arg, ArgMatches, Command};

use crate::error::{HarnessError, Result};

// ---

/// Parse a numeric value, naming its source on failure.
macro_rules! parse_num {
    ($name:expr, $raw:expr) => {
        $raw.parse()
            .map_err(|e| HarnessError::Config(format!("{}: {}", $name, e)))?
    };
}

/// Which side(s) of the secondary-partition-dimension experiment to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run the full pipeline twice, with and without the dimension.
    Compare,
    /// Single pass, hypertable carries the hash dimension on `"Device"`.
    WithDimension,
    /// Single pass, plain time-partitioned hypertable.
    WithoutDimension,
}

/// One pass of the pipeline: the report key and the dimension toggle.
#[derive(Debug, Clone, Copy)]
pub struct RunPass {
    // ---
    pub label: &'static str,
    pub with_dimension: bool,
}

impl RunMode {
    pub fn passes(self) -> Vec<RunPass> {
        // ---
        let with = RunPass {
            label: "with_dimension",
            with_dimension: true,
        };
        let without = RunPass {
            label: "without_dimension",
            with_dimension: false,
        };

        match self {
            RunMode::Compare => vec![with, without],
            RunMode::WithDimension => vec![with],
            RunMode::WithoutDimension => vec![without],
        }
    }
}

/// Strongly typed run configuration.
///
/// All fields are immutable after loading, ensuring a consistent
/// configuration snapshot for the lifetime of the run.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// PostgreSQL/TimescaleDB connection string.
    pub conn_string: String,

    /// Number of synthetic devices (`DEVICE_0 ..`).
    pub devices: u32,

    /// Number of synthetic tags per device (`TAG_0 ..`).
    pub tags: u32,

    /// Years of hourly history to generate.
    pub years: u32,

    /// Size of the device subset the benchmark queries filter on.
    pub test_devices: u32,

    /// Timed executions per benchmark query.
    pub iterations: u32,

    /// Hash partition count for the secondary dimension.
    pub partitions: u16,

    /// Path of the JSON report artifact.
    pub output: PathBuf,

    /// Which partition-dimension passes to run.
    pub mode: RunMode,
}

// ---

/// Build the CLI surface.
pub fn cli() -> Command {
    // ---
    Command::new("rollup-bench")
        .about("TimescaleDB continuous-aggregate rollup benchmark")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("conn-string")
                .help("PostgreSQL connection string (falls back to DATABASE_URL)")
                .long("conn-string"),
        )
        .arg(
            Arg::new("devices")
                .help("Number of synthetic devices (env: DEVICE_COUNT)")
                .long("devices"),
        )
        .arg(
            Arg::new("tags")
                .help("Number of synthetic tags (env: TAG_COUNT)")
                .long("tags"),
        )
        .arg(
            Arg::new("years")
                .help("Years of hourly history to generate (env: HISTORY_YEARS)")
                .long("years"),
        )
        .arg(
            Arg::new("test-devices")
                .help("Device subset size used by the benchmark queries")
                .long("test-devices")
                .default_value("10"),
        )
        .arg(
            Arg::new("iterations")
                .help("Timed executions per benchmark query")
                .long("iterations")
                .default_value("3"),
        )
        .arg(
            Arg::new("partitions")
                .help("Hash partition count for the secondary device dimension")
                .long("partitions")
                .default_value("4"),
        )
        .arg(
            Arg::new("output")
                .help("Path of the JSON report artifact")
                .long("output")
                .default_value("benchmark_results.json"),
        )
        .arg(
            Arg::new("mode")
                .help("Which partition-dimension passes to run")
                .long("mode")
                .value_parser(["compare", "with-dimension", "without-dimension"])
                .default_value("compare"),
        )
}

/// Load configuration from parsed CLI matches plus environment fallbacks.
///
/// Returns a [`HarnessError::Config`] if a required value is missing or
/// any numeric value fails to parse.
pub fn load(matches: &ArgMatches) -> Result<Config> {
    // ---
    let conn_string = matches
        .get_one::<String>("conn-string")
        .cloned()
        .or_else(|| env::var("DATABASE_URL").ok())
        .ok_or_else(|| {
            HarnessError::Config(
                "DATABASE_URL must be set in .env or environment, or passed via --conn-string"
                    .into(),
            )
        })?;

    let devices = flag_or_env(matches, "devices", "DEVICE_COUNT", 300)?;
    let tags = flag_or_env(matches, "tags", "TAG_COUNT", 50)?;
    let years = flag_or_env(matches, "years", "HISTORY_YEARS", 3)?;

    let test_devices = parse_num!("--test-devices", required(matches, "test-devices"));
    let iterations = parse_num!("--iterations", required(matches, "iterations"));
    let partitions = parse_num!("--partitions", required(matches, "partitions"));
    let output = PathBuf::from(required(matches, "output"));

    let mode = match required(matches, "mode").as_str() {
        "with-dimension" => RunMode::WithDimension,
        "without-dimension" => RunMode::WithoutDimension,
        _ => RunMode::Compare,
    };

    Ok(Config {
        conn_string,
        devices,
        tags,
        years,
        test_devices,
        iterations,
        partitions,
        output,
        mode,
    })
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> &'a String {
    // Every caller passes an arg with a clap default, so the value exists.
    matches.get_one::<String>(id).unwrap()
}

fn flag_or_env(matches: &ArgMatches, id: &str, env_var: &str, default: u32) -> Result<u32> {
    // ---
    if let Some(raw) = matches.get_one::<String>(id) {
        return Ok(parse_num!(format!("--{id}"), raw));
    }
    if let Ok(raw) = env::var(env_var) {
        return Ok(parse_num!(env_var, raw));
    }
    Ok(default)
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    ///
    /// Masks the database password while showing all values that were
    /// loaded.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!("  conn string   : {}", mask_conn_string(&self.conn_string));
        tracing::info!("  devices       : {}", self.devices);
        tracing::info!("  tags          : {}", self.tags);
        tracing::info!("  years         : {}", self.years);
        tracing::info!("  test devices  : {}", self.test_devices);
        tracing::info!("  iterations    : {}", self.iterations);
        tracing::info!("  partitions    : {}", self.partitions);
        tracing::info!("  output        : {}", self.output.display());
        tracing::info!("  mode          : {:?}", self.mode);
    }
}

/// Mask the password portion of a connection URI for logging.
pub fn mask_conn_string(conn_string: &str) -> String {
    // ---
    if let Some(at_pos) = conn_string.rfind('@') {
        if let Some(colon_pos) = conn_string[..at_pos].rfind(':') {
            return format!(
                "{}:****{}",
                &conn_string[..colon_pos],
                &conn_string[at_pos..]
            );
        }
    }
    conn_string.to_string()
}

// ---
