//! detect-worker: one ranking-event detection pass.
//!
//! Loads the detection rule and a snapshot export, scans every tracked
//! product of the target brand, appends the events to a JSON-lines file and
//! prints the effective config and run report as JSON on stdout.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use tracing::info;

use rankwatch_compute::EventDetector;
use rankwatch_core::config::load_dotenv;
use rankwatch_core::{BrandId, Config, EventSink};
use rankwatch_rules::load_detection_config;
use rankwatch_storage::{JsonLinesSink, MemoryStore};

// ── CLI ─────────────────────────────────────────────────────────────

/// Detect rank surges, steady trends and price/review/stock changes.
#[derive(Parser, Debug)]
#[command(name = "detect-worker", version, about)]
struct Cli {
    /// Config profile (reads `<PROFILE>_<KEY>` before `<KEY>`).
    #[arg(long, env = "RANKWATCH_PROFILE")]
    profile: Option<String>,

    /// DetectionConfig rule file. Defaults to `DETECTION_CONFIG`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot export (`{"products": [...], "snapshots": [...]}`).
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// JSON-lines file events are appended to.
    #[arg(long)]
    events: Option<PathBuf>,

    /// Brand to scan, overriding the rule file.
    #[arg(long)]
    brand: Option<BrandId>,

    /// Evaluate pairs on the rayon pool.
    #[arg(long)]
    parallel: bool,

    /// Detect and report without writing events.
    #[arg(long)]
    dry_run: bool,

    /// Detection time (RFC 3339). Defaults to the current time.
    #[arg(long, value_parser = parse_rfc3339)]
    now: Option<DateTime<Utc>>,
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp {raw:?}: {e}"))
}

// ── Main ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let env = match &cli.profile {
        Some(profile) => Config::for_profile(profile),
        None => Config::from_env(),
    };
    env.log_summary();

    let config_path = cli.config.unwrap_or_else(|| env.rules.detection_config.clone());
    let snapshots_path = cli.snapshots.unwrap_or_else(|| env.storage.snapshots_file.clone());
    let events_path = cli.events.unwrap_or_else(|| env.storage.events_file.clone());

    let mut detection = load_detection_config(&config_path)
        .with_context(|| format!("loading detection config {}", config_path.display()))?;
    if let Some(brand) = cli.brand.or(env.detect.target_brand_id) {
        detection.target_brand_id = brand;
    }
    detection.parallel |= cli.parallel || env.detect.parallel;

    let store = MemoryStore::from_file(&snapshots_path)
        .with_context(|| format!("loading snapshots {}", snapshots_path.display()))?;

    let detector =
        EventDetector::new(detection, &store, &store).context("building event detector")?;
    let run = match cli.now {
        Some(now) => detector.detect_events_at(now),
        None => detector.detect_events(),
    }
    .context("detection run failed")?;

    run.report.log_summary();
    info!(actionable = run.actionable().count(), "events ready for context collection");

    if cli.dry_run {
        info!(events = run.events.len(), "dry run, nothing written");
    } else {
        let mut sink = JsonLinesSink::new(&events_path);
        sink.persist(&run.events)
            .with_context(|| format!("writing events to {}", events_path.display()))?;
    }

    let output = serde_json::json!({
        "config": env.summary(),
        "report": run.report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
