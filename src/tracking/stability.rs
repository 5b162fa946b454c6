// src/tracking/stability.rs
//
// Two-level zone debounce. A track keeps a confirmed ("stable") zone and a
// candidate ("pending") zone with a run length. The stable zone only moves
// once the same candidate has been observed `threshold` frames in a row, so
// a single flickering classification near a zone boundary never becomes a
// crossing event. `None` (outside both zones) is an ordinary zone value.

use crate::zones::Zone;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStability {
    stable_zone: Option<Zone>,
    pending_zone: Option<Zone>,
    pending_count: u32,
}

/// A committed change of stable zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTransition {
    pub from: Option<Zone>,
    pub to: Option<Zone>,
}

impl ZoneStability {
    pub fn new(initial: Option<Zone>) -> Self {
        Self {
            stable_zone: initial,
            pending_zone: initial,
            pending_count: 0,
        }
    }

    pub fn stable_zone(&self) -> Option<Zone> {
        self.stable_zone
    }

    pub fn pending_zone(&self) -> Option<Zone> {
        self.pending_zone
    }

    pub fn pending_count(&self) -> u32 {
        self.pending_count
    }

    /// Feed one frame's zone observation. Returns the transition when this
    /// observation confirms a new stable zone.
    pub fn observe(&mut self, zone: Option<Zone>, threshold: u32) -> Option<ZoneTransition> {
        if zone == self.stable_zone {
            self.pending_zone = self.stable_zone;
            self.pending_count = 0;
            return None;
        }

        if zone == self.pending_zone {
            self.pending_count += 1;
        } else {
            self.pending_zone = zone;
            self.pending_count = 1;
        }

        if self.pending_count >= threshold.max(1) && self.pending_zone != self.stable_zone {
            let transition = ZoneTransition {
                from: self.stable_zone,
                to: self.pending_zone,
            };
            self.stable_zone = self.pending_zone;
            self.pending_count = 0;
            return Some(transition);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T: u32 = 2;

    #[test]
    fn test_single_flicker_is_ignored() {
        let mut s = ZoneStability::new(Some(Zone::Tray));
        assert_eq!(s.observe(Some(Zone::Incision), T), None);
        assert_eq!(s.pending_zone(), Some(Zone::Incision));
        assert_eq!(s.pending_count(), 1);

        // Reverts: pending collapses back onto the stable zone
        assert_eq!(s.observe(Some(Zone::Tray), T), None);
        assert_eq!(s.stable_zone(), Some(Zone::Tray));
        assert_eq!(s.pending_zone(), Some(Zone::Tray));
        assert_eq!(s.pending_count(), 0);
    }

    #[test]
    fn test_two_consecutive_frames_commit() {
        let mut s = ZoneStability::new(Some(Zone::Tray));
        assert_eq!(s.observe(Some(Zone::Incision), T), None);
        assert_eq!(
            s.observe(Some(Zone::Incision), T),
            Some(ZoneTransition {
                from: Some(Zone::Tray),
                to: Some(Zone::Incision),
            })
        );
        assert_eq!(s.stable_zone(), Some(Zone::Incision));
        assert_eq!(s.pending_count(), 0);

        // Staying put never re-commits
        for _ in 0..5 {
            assert_eq!(s.observe(Some(Zone::Incision), T), None);
        }
    }

    #[test]
    fn test_alternating_candidates_restart_count() {
        let mut s = ZoneStability::new(Some(Zone::Tray));
        assert_eq!(s.observe(Some(Zone::Incision), T), None);
        assert_eq!(s.observe(None, T), None);
        assert_eq!(s.pending_zone(), None);
        assert_eq!(s.pending_count(), 1);
        assert_eq!(s.observe(Some(Zone::Incision), T), None);
        assert_eq!(s.stable_zone(), Some(Zone::Tray));
    }

    #[test]
    fn test_null_zone_is_a_valid_confirmation() {
        let mut s = ZoneStability::new(Some(Zone::Incision));
        s.observe(None, T);
        let transition = s.observe(None, T).expect("should commit to no zone");
        assert_eq!(transition.from, Some(Zone::Incision));
        assert_eq!(transition.to, None);
        assert_eq!(s.stable_zone(), None);
    }

    #[test]
    fn test_threshold_of_one_commits_immediately() {
        let mut s = ZoneStability::new(None);
        let transition = s.observe(Some(Zone::Tray), 1);
        assert_eq!(
            transition,
            Some(ZoneTransition {
                from: None,
                to: Some(Zone::Tray),
            })
        );
    }

    #[test]
    fn test_higher_threshold_needs_more_frames() {
        let mut s = ZoneStability::new(Some(Zone::Tray));
        assert_eq!(s.observe(Some(Zone::Incision), 3), None);
        assert_eq!(s.observe(Some(Zone::Incision), 3), None);
        assert!(s.observe(Some(Zone::Incision), 3).is_some());
    }
}
