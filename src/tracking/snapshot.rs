// src/tracking/snapshot.rs

use super::track::Track;
use crate::pipeline::ZoneEvent;
use crate::zones::Zone;
use serde::Serialize;

/// Number of tracks durably assigned to each zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ZoneCounts {
    pub tray: usize,
    pub incision: usize,
}

impl ZoneCounts {
    pub fn from_tracks<'a, I>(tracks: I) -> Self
    where
        I: IntoIterator<Item = &'a Track>,
    {
        let mut counts = Self::default();
        for track in tracks {
            match track.stable_zone() {
                Some(Zone::Tray) => counts.tray += 1,
                Some(Zone::Incision) => counts.incision += 1,
                None => {}
            }
        }
        counts
    }

    pub fn get(&self, zone: Zone) -> usize {
        match zone {
            Zone::Tray => self.tray,
            Zone::Incision => self.incision,
        }
    }

    pub fn total(&self) -> usize {
        self.tray + self.incision
    }
}

/// Owned copy of the engine's output after a frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSnapshot {
    pub tracked_items: Vec<Track>,
    /// Newest first
    pub events: Vec<ZoneEvent>,
    pub counts: ZoneCounts,
}

/// What a single `ingest`/`advance_to` call did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub timestamp_ms: f64,
    pub accepted: usize,
    pub dropped: usize,
    pub deduplicated: usize,
    pub matched: usize,
    pub rescued: usize,
    pub created: Vec<u64>,
    pub merged: Vec<u64>,
    pub pruned: Vec<u64>,
    /// Events confirmed during this call, oldest first
    pub events: Vec<ZoneEvent>,
}
