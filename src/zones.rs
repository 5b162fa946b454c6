// src/zones.rs
//
// Zone geometry for the operating field. Two named, axis-aligned rectangles
// in normalized [0,1] image coordinates: the instrument tray and the incision.

use serde::{Deserialize, Deserializer, Serialize};

/// Named region of the camera frame an item can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Tray,
    Incision,
}

impl Zone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tray => "tray",
            Self::Incision => "incision",
        }
    }

    /// Lenient label parsing for zone hints coming from the vision service.
    /// Anything that is not a known zone name means "no zone".
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "tray" => Some(Self::Tray),
            "incision" => Some(Self::Incision),
            _ => None,
        }
    }
}

/// Display helper for optional zones (`None` prints as "none").
pub fn zone_label(zone: Option<Zone>) -> &'static str {
    zone.map(|z| z.as_str()).unwrap_or("none")
}

/// Deserializes a zone hint, mapping unknown labels and non-strings to `None`.
pub fn deserialize_zone_hint<'de, D>(deserializer: D) -> Result<Option<Zone>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(label)) => Zone::parse(&label),
        _ => None,
    })
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RectCorners {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

/// Normalized rectangle. Corners are reordered on construction so that
/// `x1 <= x2` and `y1 <= y2` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RectCorners")]
pub struct ZoneRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl From<RectCorners> for ZoneRect {
    fn from(c: RectCorners) -> Self {
        ZoneRect::new(c.x1, c.y1, c.x2, c.y2)
    }
}

impl ZoneRect {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Edge-inclusive containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when every corner is finite and inside the unit square.
    pub fn is_normalized(&self) -> bool {
        [self.x1, self.y1, self.x2, self.y2]
            .iter()
            .all(|v| v.is_finite() && (0.0..=1.0).contains(v))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneSet {
    pub tray: ZoneRect,
    pub incision: ZoneRect,
}

impl ZoneSet {
    pub fn new(tray: ZoneRect, incision: ZoneRect) -> Self {
        Self { tray, incision }
    }

    pub fn rect(&self, zone: Zone) -> &ZoneRect {
        match zone {
            Zone::Tray => &self.tray,
            Zone::Incision => &self.incision,
        }
    }

    /// Containment classification. Incision is tested first so an item in an
    /// overlap between the two rectangles counts as inside the patient.
    pub fn classify(&self, x: f64, y: f64) -> Option<Zone> {
        if self.incision.contains(x, y) {
            Some(Zone::Incision)
        } else if self.tray.contains(x, y) {
            Some(Zone::Tray)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zones() -> ZoneSet {
        ZoneSet::new(
            ZoneRect::new(0.0, 0.0, 0.4, 0.4),
            ZoneRect::new(0.3, 0.3, 0.9, 0.9),
        )
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let rect = ZoneRect::new(0.8, 0.9, 0.2, 0.1);
        assert_eq!(rect, ZoneRect::new(0.2, 0.1, 0.8, 0.9));
        assert!((rect.width() - 0.6).abs() < 1e-9);
        assert!((rect.height() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_contains_is_edge_inclusive() {
        let rect = ZoneRect::new(0.2, 0.2, 0.6, 0.6);
        assert!(rect.contains(0.2, 0.6));
        assert!(rect.contains(0.4, 0.4));
        assert!(!rect.contains(0.61, 0.4));
    }

    #[test]
    fn test_classify_prefers_incision_on_overlap() {
        let zones = zones();
        assert_eq!(zones.classify(0.1, 0.1), Some(Zone::Tray));
        assert_eq!(zones.classify(0.35, 0.35), Some(Zone::Incision));
        assert_eq!(zones.classify(0.8, 0.8), Some(Zone::Incision));
        assert_eq!(zones.classify(0.95, 0.05), None);
    }

    #[test]
    fn test_zone_parse_is_lenient() {
        assert_eq!(Zone::parse("Incision "), Some(Zone::Incision));
        assert_eq!(Zone::parse("tray"), Some(Zone::Tray));
        assert_eq!(Zone::parse("outside"), None);
        assert_eq!(Zone::parse(""), None);
    }

    #[test]
    fn test_zone_set_deserializes_and_reorders() {
        let json = r#"{
            "tray": {"x1": 0.5, "y1": 0.5, "x2": 0.1, "y2": 0.2},
            "incision": {"x1": 0.6, "y1": 0.6, "x2": 0.9, "y2": 0.9}
        }"#;
        let zones: ZoneSet = serde_json::from_str(json).unwrap();
        assert_eq!(zones.tray, ZoneRect::new(0.1, 0.2, 0.5, 0.5));
        assert!(zones.tray.is_normalized());
        assert_eq!(zones.rect(Zone::Incision).x1, 0.6);
    }
}
