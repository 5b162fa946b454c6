// src/tracking/track.rs

use super::matching::Observation;
use super::stability::{ZoneStability, ZoneTransition};
use crate::zones::Zone;
use serde::Serialize;

/// One physical item followed across frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: u64,
    #[serde(rename = "type")]
    pub item_type: String,
    pub x: f64,
    pub y: f64,
    /// Current durable zone; always equal to the stable zone
    pub zone: Option<Zone>,
    #[serde(flatten)]
    stability: ZoneStability,
    #[serde(rename = "firstSeen")]
    pub first_seen_ms: f64,
    #[serde(rename = "lastSeen")]
    pub last_seen_ms: f64,
    pub hits: u32,
}

impl Track {
    pub(crate) fn new(id: u64, obs: &Observation, timestamp_ms: f64) -> Self {
        Self {
            id,
            item_type: obs.item_type.clone(),
            x: obs.x,
            y: obs.y,
            zone: obs.zone,
            stability: ZoneStability::new(obs.zone),
            first_seen_ms: timestamp_ms,
            last_seen_ms: timestamp_ms,
            hits: 1,
        }
    }

    pub fn stable_zone(&self) -> Option<Zone> {
        self.stability.stable_zone()
    }

    pub fn pending_zone(&self) -> Option<Zone> {
        self.stability.pending_zone()
    }

    pub fn pending_count(&self) -> u32 {
        self.stability.pending_count()
    }

    pub fn age_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.first_seen_ms
    }

    pub fn since_seen_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.last_seen_ms
    }

    /// Apply a matched detection: move, refresh, and advance zone stability.
    pub(crate) fn update_with_observation(
        &mut self,
        obs: &Observation,
        timestamp_ms: f64,
        stability_frames: u32,
    ) -> Option<ZoneTransition> {
        self.x = obs.x;
        self.y = obs.y;
        self.last_seen_ms = timestamp_ms;
        self.hits += 1;

        let transition = self.stability.observe(obs.zone, stability_frames);
        self.zone = self.stability.stable_zone();
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(x: f64, y: f64, zone: Option<Zone>) -> Observation {
        Observation {
            item_type: "forceps".to_string(),
            x,
            y,
            zone,
        }
    }

    #[test]
    fn test_new_track_starts_settled() {
        let track = Track::new(7, &obs(0.2, 0.3, Some(Zone::Tray)), 1000.0);
        assert_eq!(track.zone, Some(Zone::Tray));
        assert_eq!(track.stable_zone(), Some(Zone::Tray));
        assert_eq!(track.pending_zone(), Some(Zone::Tray));
        assert_eq!(track.pending_count(), 0);
        assert_eq!(track.first_seen_ms, 1000.0);
        assert_eq!(track.last_seen_ms, 1000.0);
    }

    #[test]
    fn test_zone_field_follows_stable_zone_only() {
        let mut track = Track::new(1, &obs(0.2, 0.3, Some(Zone::Tray)), 0.0);
        track.update_with_observation(&obs(0.21, 0.3, Some(Zone::Incision)), 2000.0, 2);
        assert_eq!(track.zone, Some(Zone::Tray));
        assert_eq!((track.x, track.y), (0.21, 0.3));
        assert_eq!(track.last_seen_ms, 2000.0);

        let transition =
            track.update_with_observation(&obs(0.22, 0.3, Some(Zone::Incision)), 4000.0, 2);
        assert!(transition.is_some());
        assert_eq!(track.zone, Some(Zone::Incision));
        assert_eq!(track.hits, 3);
        assert_eq!(track.age_ms(5000.0), 5000.0);
        assert_eq!(track.since_seen_ms(5000.0), 1000.0);
    }

    #[test]
    fn test_serializes_with_camel_case_fields() {
        let track = Track::new(3, &obs(0.5, 0.5, None), 10.0);
        let value = serde_json::to_value(&track).unwrap();
        assert_eq!(value["type"], "forceps");
        assert_eq!(value["stableZone"], serde_json::Value::Null);
        assert_eq!(value["pendingCount"], 0);
        assert_eq!(value["lastSeen"], 10.0);
        assert_eq!(value["firstSeen"], 10.0);
    }
}
