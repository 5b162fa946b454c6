// src/replay.rs
//
// Detection source for offline runs: recorded detection frames stored as
// JSON lines, one `DetectionFrame` per line, replayed into the engine over a
// bounded channel.

use crate::types::{DetectionFrame, ReplayConfig};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Recursively collects detection logs with the given extension, sorted by path.
pub fn find_detection_logs(dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    anyhow::ensure!(dir.exists(), "input directory {} does not exist", dir.display());

    let mut logs = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            logs.push(path.to_path_buf());
        }
    }
    logs.sort();

    info!("Found {} detection log(s) in {}", logs.len(), dir.display());
    Ok(logs)
}

/// A single file is replayed as-is; a directory is searched for logs.
pub fn resolve_logs(input: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        Ok(vec![input.to_path_buf()])
    } else {
        find_detection_logs(input, extension)
    }
}

pub fn read_frames(path: impl AsRef<Path>) -> Result<Vec<DetectionFrame>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_frames(BufReader::new(file), &path.display().to_string())
}

/// Parses JSON-lines frames. Blank lines are skipped; malformed lines are
/// logged and skipped so one bad record does not end the replay.
pub fn parse_frames<R: BufRead>(reader: R, origin: &str) -> Result<Vec<DetectionFrame>> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {} line {}", origin, idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<DetectionFrame>(trimmed) {
            Ok(frame) => frames.push(frame),
            Err(e) => warn!("Skipping {}:{}: {}", origin, idx + 1, e),
        }
    }
    debug!("Parsed {} frame(s) from {}", frames.len(), origin);
    Ok(frames)
}

/// Delay before sending a frame when pacing by recorded timestamps.
pub fn pacing_delay(previous_ms: Option<f64>, current_ms: f64, speed: f64) -> Duration {
    let gap = match previous_ms {
        Some(prev) => current_ms - prev,
        None => 0.0,
    };
    if !gap.is_finite() || gap <= 0.0 || speed <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(gap / speed / 1000.0)
}

/// Spawns the source task. Frames arrive on the receiver strictly in file
/// order; the task stops early if the receiver is dropped.
pub fn spawn_source(
    frames: Vec<DetectionFrame>,
    config: &ReplayConfig,
) -> (JoinHandle<usize>, mpsc::Receiver<DetectionFrame>) {
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let realtime = config.realtime;
    let speed = config.speed;

    let handle = tokio::spawn(async move {
        let mut sent = 0usize;
        let mut previous: Option<f64> = None;
        for frame in frames {
            if realtime {
                let delay = pacing_delay(previous, frame.timestamp_ms, speed);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
            previous = Some(frame.timestamp_ms);
            if tx.send(frame).await.is_err() {
                debug!("Replay receiver dropped after {} frame(s)", sent);
                break;
            }
            sent += 1;
        }
        sent
    });

    (handle, rx)
}
