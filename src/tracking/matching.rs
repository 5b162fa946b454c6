// src/tracking/matching.rs
//
// Detection hygiene and greedy detection → track association.
//
// Design:
//   - Detections are validated first; bad ones are dropped, never clamped
//   - Same-frame duplicates of one object collapse onto the first report
//   - Matching is greedy, detection by detection in supplied order. Each
//     detection takes the nearest unclaimed track of the same type inside
//     the match radius. Deterministic, O(n·m), fine for tens of items
//   - Optional rescue pass for tracks seen moments ago that moved a bit
//     further than the match radius

use super::track::Track;
use crate::types::{Detection, RescueConfig};
use crate::zones::Zone;

/// A detection that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub item_type: String,
    pub x: f64,
    pub y: f64,
    pub zone: Option<Zone>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingType,
    MissingCoordinate,
    NonFiniteCoordinate,
    OutOfRange,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingType => "missing type",
            Self::MissingCoordinate => "missing coordinate",
            Self::NonFiniteCoordinate => "non-finite coordinate",
            Self::OutOfRange => "coordinate outside [0,1]",
        }
    }
}

/// Euclidean distance in normalized frame coordinates.
pub fn distance(ax: f64, ay: f64, bx: f64, by: f64) -> f64 {
    ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
}

pub fn sanitize(det: &Detection) -> Result<Observation, Rejection> {
    let item_type = match det.item_type.as_deref() {
        Some(t) if !t.trim().is_empty() => t.to_string(),
        _ => return Err(Rejection::MissingType),
    };
    let (x, y) = match (det.x, det.y) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(Rejection::MissingCoordinate),
    };
    if !x.is_finite() || !y.is_finite() {
        return Err(Rejection::NonFiniteCoordinate);
    }
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(Rejection::OutOfRange);
    }
    Ok(Observation {
        item_type,
        x,
        y,
        zone: det.zone,
    })
}

/// Drops every observation that lies within `threshold` of an earlier kept
/// observation of the same type. Returns the kept list and how many were
/// dropped.
pub fn dedup_observations(observations: Vec<Observation>, threshold: f64) -> (Vec<Observation>, usize) {
    let total = observations.len();
    let mut kept: Vec<Observation> = Vec::with_capacity(total);
    for obs in observations {
        let duplicate = kept.iter().any(|k| {
            k.item_type == obs.item_type && distance(k.x, k.y, obs.x, obs.y) < threshold
        });
        if !duplicate {
            kept.push(obs);
        }
    }
    let removed = total - kept.len();
    (kept, removed)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchKind {
    /// Nearest same-type track inside the match radius
    Direct,
    /// Recently seen same-type track inside the wider rescue radius
    Rescue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackMatch {
    pub index: usize,
    pub distance: f64,
    pub kind: MatchKind,
}

pub struct Matcher {
    pub match_threshold: f64,
    pub rescue: Option<RescueConfig>,
}

impl Matcher {
    /// Finds the track for one observation among `tracks`, skipping indices
    /// already claimed this frame. Ties keep the earliest track.
    pub fn find(
        &self,
        tracks: &[Track],
        claimed: &[bool],
        obs: &Observation,
        now_ms: f64,
    ) -> Option<TrackMatch> {
        if let Some((index, distance)) =
            nearest(tracks, claimed, obs, self.match_threshold, |_| true)
        {
            return Some(TrackMatch {
                index,
                distance,
                kind: MatchKind::Direct,
            });
        }

        let rescue = self.rescue?;
        nearest(tracks, claimed, obs, rescue.distance, |t| {
            t.since_seen_ms(now_ms) < rescue.window_ms
        })
        .map(|(index, distance)| TrackMatch {
            index,
            distance,
            kind: MatchKind::Rescue,
        })
    }
}

fn nearest<F>(
    tracks: &[Track],
    claimed: &[bool],
    obs: &Observation,
    radius: f64,
    eligible: F,
) -> Option<(usize, f64)>
where
    F: Fn(&Track) -> bool,
{
    let mut best: Option<(usize, f64)> = None;
    for (ti, track) in tracks.iter().enumerate() {
        if claimed.get(ti).copied().unwrap_or(false) {
            continue;
        }
        if track.item_type != obs.item_type || !eligible(track) {
            continue;
        }
        let d = distance(track.x, track.y, obs.x, obs.y);
        if d < radius && best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((ti, d));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(item_type: &str, x: f64, y: f64) -> Observation {
        Observation {
            item_type: item_type.to_string(),
            x,
            y,
            zone: None,
        }
    }

    fn track(id: u64, item_type: &str, x: f64, y: f64, last_seen_ms: f64) -> Track {
        Track::new(id, &obs(item_type, x, y), last_seen_ms)
    }

    fn matcher() -> Matcher {
        Matcher {
            match_threshold: 0.08,
            rescue: None,
        }
    }

    #[test]
    fn test_sanitize_rejections() {
        let ok = Detection::new("scalpel", 0.5, 0.5, None);
        assert!(sanitize(&ok).is_ok());

        let blank = Detection::new("  ", 0.5, 0.5, None);
        assert_eq!(sanitize(&blank), Err(Rejection::MissingType));

        let mut missing = Detection::new("scalpel", 0.5, 0.5, None);
        missing.y = None;
        assert_eq!(sanitize(&missing), Err(Rejection::MissingCoordinate));

        let nan = Detection::new("scalpel", f64::NAN, 0.5, None);
        assert_eq!(sanitize(&nan), Err(Rejection::NonFiniteCoordinate));

        let outside = Detection::new("scalpel", 0.5, 1.2, None);
        assert_eq!(sanitize(&outside), Err(Rejection::OutOfRange));

        let edge = Detection::new("scalpel", 0.0, 1.0, None);
        assert!(sanitize(&edge).is_ok());
    }

    #[test]
    fn test_dedup_keeps_first_of_same_type_only() {
        let input = vec![
            obs("forceps", 0.50, 0.50),
            obs("forceps", 0.51, 0.505),
            obs("scissor", 0.51, 0.505),
            obs("forceps", 0.70, 0.70),
        ];
        let (kept, removed) = dedup_observations(input, 0.08);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 3);
        assert_eq!((kept[0].x, kept[0].y), (0.50, 0.50));
        assert_eq!(kept[1].item_type, "scissor");
    }

    #[test]
    fn test_find_requires_same_type() {
        let tracks = vec![track(1, "clamp", 0.5, 0.5, 0.0)];
        let claimed = vec![false];
        assert!(matcher()
            .find(&tracks, &claimed, &obs("forceps", 0.5, 0.5), 0.0)
            .is_none());
    }

    #[test]
    fn test_find_picks_nearest_unclaimed() {
        let tracks = vec![
            track(1, "sponge", 0.50, 0.50, 0.0),
            track(2, "sponge", 0.53, 0.50, 0.0),
        ];
        let found = matcher()
            .find(&tracks, &[false, false], &obs("sponge", 0.54, 0.50), 0.0)
            .unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.kind, MatchKind::Direct);

        let found = matcher()
            .find(&tracks, &[false, true], &obs("sponge", 0.54, 0.50), 0.0)
            .unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let tracks = vec![track(1, "sponge", 0.50, 0.50, 0.0)];
        assert!(matcher()
            .find(&tracks, &[false], &obs("sponge", 0.60, 0.50), 0.0)
            .is_none());
    }

    #[test]
    fn test_rescue_only_for_recent_tracks() {
        let m = Matcher {
            match_threshold: 0.08,
            rescue: Some(RescueConfig::default()),
        };
        let tracks = vec![
            track(1, "needle", 0.30, 0.30, 0.0),
            track(2, "needle", 0.70, 0.70, 900.0),
        ];
        // 0.12 away from both; only track 2 is inside the rescue window
        let found = m
            .find(&tracks, &[false, false], &obs("needle", 0.70, 0.82), 1000.0)
            .unwrap();
        assert_eq!(found.index, 1);
        assert_eq!(found.kind, MatchKind::Rescue);

        assert!(m
            .find(&tracks, &[false, false], &obs("needle", 0.30, 0.42), 1000.0)
            .is_none());
    }
}
