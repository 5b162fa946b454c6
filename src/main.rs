// src/main.rs

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use surgical_tracker::pipeline::MetricsSummary;
use surgical_tracker::replay;
use surgical_tracker::tracking::{TrackingEngine, TrackingSnapshot};
use surgical_tracker::zones::zone_label;
use surgical_tracker::{ClosureVerdict, Config};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay surgical detection logs through the item tracker", long_about = None)]
struct Args {
    /// YAML config file (defaults are used if it does not exist)
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Detection log file or directory (overrides replay.input_dir)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pace frames by their recorded timestamps
    #[arg(long)]
    realtime: bool,

    /// Print the final snapshot of each log as JSON
    #[arg(long)]
    json: bool,
}

struct LogSummary {
    snapshot: TrackingSnapshot,
    verdict: ClosureVerdict,
    metrics: MetricsSummary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_found = args.config.exists();
    let mut config = if config_found {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    if args.realtime {
        config.replay.realtime = true;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🩺 Surgical item tracker starting");
    if config_found {
        info!("✓ Configuration loaded from {}", args.config.display());
    } else {
        warn!(
            "Config {} not found, using defaults",
            args.config.display()
        );
    }
    info!(
        "Tracking: match={:.3}, merge={:.3}, stability_frames={}, stale={:.0}ms",
        config.tracking.match_threshold,
        config.tracking.merge_threshold,
        config.tracking.stability_frames,
        config.tracking.stale_ms
    );

    let input = args
        .input
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.replay.input_dir));
    let logs = replay::resolve_logs(&input, &config.replay.extension)?;

    if logs.is_empty() {
        error!("No detection logs found in {}", input.display());
        return Ok(());
    }

    for (idx, path) in logs.iter().enumerate() {
        info!("========================================");
        info!("Replaying log {}/{}: {}", idx + 1, logs.len(), path.display());
        info!("========================================");

        match process_log(path, &config).await {
            Ok(summary) => report(&summary, args.json)?,
            Err(e) => error!("Failed to replay {}: {:#}", path.display(), e),
        }
    }

    Ok(())
}

async fn process_log(path: &Path, config: &Config) -> Result<LogSummary> {
    let frames = replay::read_frames(path)?;
    info!("Loaded {} frame(s)", frames.len());

    let mut engine = TrackingEngine::new(config.tracking.clone()).with_zones(config.zones);
    let (source, mut rx) = replay::spawn_source(frames, &config.replay);

    while let Some(frame) = rx.recv().await {
        let report = engine.ingest(&frame);
        for event in &report.events {
            let marker = if event.to == Some(surgical_tracker::Zone::Incision) {
                "🔴"
            } else {
                "🟢"
            };
            info!(
                "{} {:.1}s {} {} T{}: {} → {}",
                marker,
                event.timestamp / 1000.0,
                event.kind.as_str().to_uppercase(),
                event.item_type,
                event.item_id,
                zone_label(event.from),
                zone_label(event.to)
            );
        }
        if report.accepted > 0 || !report.pruned.is_empty() {
            let counts = engine.counts();
            info!(
                "t={:.1}s tracked={} tray={} incision={}",
                report.timestamp_ms / 1000.0,
                engine.track_count(),
                counts.tray,
                counts.incision
            );
        }
    }

    let sent = source.await.context("replay source task failed")?;
    info!("Replay finished after {} frame(s)", sent);

    let snapshot = engine.snapshot();
    let verdict = ClosureVerdict::evaluate(&snapshot);
    Ok(LogSummary {
        snapshot,
        verdict,
        metrics: engine.metrics().summary(),
    })
}

fn report(summary: &LogSummary, as_json: bool) -> Result<()> {
    let m = &summary.metrics;
    info!("✓ Log processed");
    info!("  Frames ingested: {} ({} empty)", m.frames_ingested, m.empty_frames);
    info!(
        "  Detections: {} accepted, {} dropped, {} deduplicated",
        m.detections_accepted, m.detections_dropped, m.detections_deduplicated
    );
    info!(
        "  Tracks: {} created, {} merged, {} pruned",
        m.tracks_created, m.tracks_merged, m.tracks_pruned
    );
    info!("  Zone events: {}", m.events_emitted);
    info!(
        "  Final counts: tray={} incision={}",
        summary.snapshot.counts.tray, summary.snapshot.counts.incision
    );

    if summary.verdict.is_clear() {
        info!("🔒 {}", summary.verdict.describe());
    } else {
        warn!("🚨 {}", summary.verdict.describe());
    }

    if as_json {
        let json = serde_json::to_string_pretty(&summary.snapshot)
            .context("serializing snapshot")?;
        println!("{}", json);
    }
    Ok(())
}
