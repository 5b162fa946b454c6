// src/tracking/engine.rs
//
// Frame-by-frame item tracker for the operating field.
//
// Each ingested frame runs, in order:
//   1. hygiene     — drop malformed detections, collapse same-frame duplicates
//   2. matching    — greedy same-type nearest-neighbour association
//   3. stability   — per-track zone debounce, events on confirmed crossings
//   4. merge       — collapse same-type tracks that converged on one spot
//   5. prune       — forget tracks unseen for longer than the stale window
//
// The engine owns all track and event state. Callers only ever get copies.

use super::matching::{self, MatchKind, Matcher};
use super::snapshot::{FrameReport, TrackingSnapshot, ZoneCounts};
use super::track::Track;
use crate::pipeline::{EventLog, TrackingMetrics, ZoneEvent};
use crate::types::{DetectionFrame, TrackingConfig};
use crate::zones::{zone_label, Zone, ZoneSet};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

pub struct TrackingEngine {
    config: TrackingConfig,
    zones: Option<ZoneSet>,
    tracks: Vec<Track>,
    events: EventLog,
    next_track_id: u64,
    clock_ms: Option<f64>,
    metrics: TrackingMetrics,
}

impl TrackingEngine {
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            config,
            zones: None,
            tracks: Vec::with_capacity(32),
            events: EventLog::new(),
            next_track_id: 1,
            clock_ms: None,
            metrics: TrackingMetrics::new(),
        }
    }

    pub fn with_zones(mut self, zones: Option<ZoneSet>) -> Self {
        self.zones = zones;
        self
    }

    /// Replace the zone rectangles (recalibration). Existing tracks keep
    /// their stable zones; only future classifications are affected.
    pub fn set_zones(&mut self, zones: Option<ZoneSet>) {
        if zones.is_some() {
            info!("📐 Zones updated");
        }
        self.zones = zones;
    }

    pub fn zones(&self) -> Option<&ZoneSet> {
        self.zones.as_ref()
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TrackingMetrics {
        &self.metrics
    }

    /// Latest frame timestamp the engine has accepted.
    pub fn clock_ms(&self) -> Option<f64> {
        self.clock_ms
    }

    /// Process one detection frame. An empty or missing item list is a no-op.
    pub fn ingest(&mut self, frame: &DetectionFrame) -> FrameReport {
        let items = match frame.items.as_deref() {
            Some(items) if !items.is_empty() => items,
            _ => {
                self.metrics.inc(&self.metrics.empty_frames);
                debug!("Empty frame at {:.0}ms ignored", frame.timestamp_ms);
                return FrameReport {
                    timestamp_ms: frame.timestamp_ms,
                    ..Default::default()
                };
            }
        };

        let now = self.advance_clock(frame.timestamp_ms);
        self.metrics.inc(&self.metrics.frames_ingested);
        let mut report = FrameReport {
            timestamp_ms: now,
            ..Default::default()
        };

        // ── HYGIENE ──
        let mut observations = Vec::with_capacity(items.len());
        for det in items {
            match matching::sanitize(det) {
                Ok(mut obs) => {
                    if obs.zone.is_none() && self.config.classify_untagged {
                        if let Some(zones) = &self.zones {
                            obs.zone = zones.classify(obs.x, obs.y);
                        }
                    }
                    observations.push(obs);
                }
                Err(reason) => {
                    report.dropped += 1;
                    debug!(
                        "Dropped detection {:?} ({:?}, {:?}): {}",
                        det.item_type,
                        det.x,
                        det.y,
                        reason.as_str()
                    );
                }
            }
        }
        let (observations, deduplicated) =
            matching::dedup_observations(observations, self.config.input_dedup_threshold);
        report.deduplicated = deduplicated;
        report.accepted = observations.len();

        // ── MATCHING + STABILITY ──
        // Tracks created during this frame are not candidates for later
        // detections in the same frame.
        let matcher = Matcher {
            match_threshold: self.config.match_threshold,
            rescue: self.config.rescue,
        };
        let candidates = self.tracks.len();
        let mut claimed = vec![false; candidates];

        for obs in &observations {
            match matcher.find(&self.tracks[..candidates], &claimed, obs, now) {
                Some(found) => {
                    claimed[found.index] = true;
                    report.matched += 1;

                    let track = &mut self.tracks[found.index];
                    if found.kind == MatchKind::Rescue {
                        report.rescued += 1;
                        info!(
                            "🔗 Rescue: T{} ({}) ← det at ({:.3},{:.3}), dist={:.3}",
                            track.id, track.item_type, obs.x, obs.y, found.distance
                        );
                    }

                    match track.update_with_observation(obs, now, self.config.stability_frames) {
                        Some(transition) => {
                            info!(
                                "✅ T{} ({}) zone confirmed: {} → {}",
                                track.id,
                                track.item_type,
                                zone_label(transition.from),
                                zone_label(transition.to)
                            );
                            let event = self.events.record(
                                now,
                                &track.item_type,
                                track.id,
                                transition.from,
                                transition.to,
                            );
                            report.events.push(event);
                        }
                        None if track.pending_count() > 0 => {
                            debug!(
                                "⏳ T{} raw={} but holding {} ({}/{})",
                                track.id,
                                zone_label(track.pending_zone()),
                                zone_label(track.stable_zone()),
                                track.pending_count(),
                                self.config.stability_frames
                            );
                        }
                        None => {}
                    }
                }
                None => {
                    let id = self.next_track_id;
                    self.next_track_id += 1;
                    let track = Track::new(id, obs, now);
                    info!(
                        "🆕 New track T{}: {} at ({:.3},{:.3}) zone={}",
                        id,
                        track.item_type,
                        track.x,
                        track.y,
                        zone_label(track.zone)
                    );
                    report.created.push(id);
                    self.tracks.push(track);
                }
            }
        }

        self.merge_duplicates(&mut report);
        self.prune_stale(now, &mut report);
        self.record_metrics(&report);
        report
    }

    /// Move the engine clock forward without a frame and prune stale tracks.
    pub fn advance_to(&mut self, now_ms: f64) -> FrameReport {
        let now = self.advance_clock(now_ms);
        let mut report = FrameReport {
            timestamp_ms: now,
            ..Default::default()
        };
        self.prune_stale(now, &mut report);
        self.record_metrics(&report);
        report
    }

    /// Forget all tracks and events. Id counters keep running so ids are
    /// never reused within one engine.
    pub fn reset(&mut self) {
        info!(
            "Resetting tracker ({} tracks, {} events)",
            self.tracks.len(),
            self.events.len()
        );
        self.tracks.clear();
        self.events = EventLog::continuing_from(&self.events);
        self.clock_ms = None;
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn track(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn tracked_items(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    /// Tracks currently confirmed inside the incision zone.
    pub fn retained_items(&self) -> Vec<Track> {
        self.tracks
            .iter()
            .filter(|t| t.stable_zone() == Some(Zone::Incision))
            .cloned()
            .collect()
    }

    pub fn counts(&self) -> ZoneCounts {
        ZoneCounts::from_tracks(&self.tracks)
    }

    /// Event log, newest first.
    pub fn events(&self) -> Vec<ZoneEvent> {
        self.events.newest_first()
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        TrackingSnapshot {
            tracked_items: self.tracked_items(),
            events: self.events(),
            counts: self.counts(),
        }
    }

    fn advance_clock(&mut self, timestamp_ms: f64) -> f64 {
        let now = match self.clock_ms {
            Some(clock) if !timestamp_ms.is_finite() || timestamp_ms < clock => {
                warn!(
                    "⏰ Frame timestamp {}ms behind engine clock {:.0}ms, clamping",
                    timestamp_ms, clock
                );
                clock
            }
            None if !timestamp_ms.is_finite() => {
                warn!("⏰ Non-finite first timestamp {}, starting at 0", timestamp_ms);
                0.0
            }
            _ => timestamp_ms,
        };
        self.clock_ms = Some(now);
        now
    }

    /// Most recently seen first; a track within the merge radius of an
    /// already kept same-type track is dropped.
    fn merge_duplicates(&mut self, report: &mut FrameReport) {
        let mut tracks = std::mem::take(&mut self.tracks);
        tracks.sort_by(|a, b| {
            b.last_seen_ms
                .partial_cmp(&a.last_seen_ms)
                .unwrap_or(Ordering::Equal)
        });

        let threshold = self.config.merge_threshold;
        let mut kept: Vec<Track> = Vec::with_capacity(tracks.len());
        for track in tracks {
            let keeper = kept.iter().find(|k| {
                k.item_type == track.item_type
                    && matching::distance(k.x, k.y, track.x, track.y) < threshold
            });
            if let Some(keeper) = keeper {
                debug!(
                    "🔀 T{} ({}) merged into T{}",
                    track.id, track.item_type, keeper.id
                );
                report.merged.push(track.id);
                continue;
            }
            kept.push(track);
        }
        self.tracks = kept;
    }

    fn prune_stale(&mut self, now: f64, report: &mut FrameReport) {
        let stale_ms = self.config.stale_ms;
        let mut stale: Vec<Track> = Vec::new();
        self.tracks.retain(|t| {
            if t.since_seen_ms(now) > stale_ms {
                stale.push(t.clone());
                false
            } else {
                true
            }
        });

        for track in stale {
            let unseen = track.since_seen_ms(now);
            if track.stable_zone() == Some(Zone::Incision) {
                warn!(
                    "⚠️  T{} ({}) lost from view while in incision (unseen {:.0}ms)",
                    track.id, track.item_type, unseen
                );
                if self.config.emit_exit_on_prune {
                    let event =
                        self.events
                            .record(now, &track.item_type, track.id, Some(Zone::Incision), None);
                    report.events.push(event);
                }
            } else {
                info!(
                    "🗑️  T{} ({}) pruned (unseen {:.0}ms)",
                    track.id, track.item_type, unseen
                );
            }
            report.pruned.push(track.id);
        }
    }

    fn record_metrics(&self, report: &FrameReport) {
        let m = &self.metrics;
        m.add(&m.detections_accepted, report.accepted);
        m.add(&m.detections_dropped, report.dropped);
        m.add(&m.detections_deduplicated, report.deduplicated);
        m.add(&m.tracks_created, report.created.len());
        m.add(&m.tracks_rescued, report.rescued);
        m.add(&m.tracks_merged, report.merged.len());
        m.add(&m.tracks_pruned, report.pruned.len());
        m.add(&m.events_emitted, report.events.len());
    }
}
