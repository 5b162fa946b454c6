// src/pipeline/metrics.rs
//
// In-process counters for the tracking engine. Cloning shares the same
// counters, so a reporting task can hold a handle while the engine runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct TrackingMetrics {
    pub frames_ingested: Arc<AtomicU64>,
    pub empty_frames: Arc<AtomicU64>,
    pub detections_accepted: Arc<AtomicU64>,
    pub detections_dropped: Arc<AtomicU64>,
    pub detections_deduplicated: Arc<AtomicU64>,
    pub tracks_created: Arc<AtomicU64>,
    pub tracks_rescued: Arc<AtomicU64>,
    pub tracks_merged: Arc<AtomicU64>,
    pub tracks_pruned: Arc<AtomicU64>,
    pub events_emitted: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl Default for TrackingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingMetrics {
    pub fn new() -> Self {
        Self {
            frames_ingested: Arc::new(AtomicU64::new(0)),
            empty_frames: Arc::new(AtomicU64::new(0)),
            detections_accepted: Arc::new(AtomicU64::new(0)),
            detections_dropped: Arc::new(AtomicU64::new(0)),
            detections_deduplicated: Arc::new(AtomicU64::new(0)),
            tracks_created: Arc::new(AtomicU64::new(0)),
            tracks_rescued: Arc::new(AtomicU64::new(0)),
            tracks_merged: Arc::new(AtomicU64::new(0)),
            tracks_pruned: Arc::new(AtomicU64::new(0)),
            events_emitted: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, counter: &AtomicU64, n: usize) {
        counter.fetch_add(n as u64, Ordering::Relaxed);
    }

    pub fn frames_per_second(&self) -> f64 {
        let frames = self.frames_ingested.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            frames_ingested: self.frames_ingested.load(Ordering::Relaxed),
            empty_frames: self.empty_frames.load(Ordering::Relaxed),
            detections_accepted: self.detections_accepted.load(Ordering::Relaxed),
            detections_dropped: self.detections_dropped.load(Ordering::Relaxed),
            detections_deduplicated: self.detections_deduplicated.load(Ordering::Relaxed),
            tracks_created: self.tracks_created.load(Ordering::Relaxed),
            tracks_rescued: self.tracks_rescued.load(Ordering::Relaxed),
            tracks_merged: self.tracks_merged.load(Ordering::Relaxed),
            tracks_pruned: self.tracks_pruned.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            frames_per_second: self.frames_per_second(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub frames_ingested: u64,
    pub empty_frames: u64,
    pub detections_accepted: u64,
    pub detections_dropped: u64,
    pub detections_deduplicated: u64,
    pub tracks_created: u64,
    pub tracks_rescued: u64,
    pub tracks_merged: u64,
    pub tracks_pruned: u64,
    pub events_emitted: u64,
    pub frames_per_second: f64,
    pub elapsed_secs: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_counters() {
        let metrics = TrackingMetrics::new();
        let handle = metrics.clone();
        metrics.inc(&metrics.frames_ingested);
        metrics.add(&metrics.detections_accepted, 3);

        let summary = handle.summary();
        assert_eq!(summary.frames_ingested, 1);
        assert_eq!(summary.detections_accepted, 3);
        assert_eq!(summary.events_emitted, 0);
    }
}
