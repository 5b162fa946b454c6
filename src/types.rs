use crate::zones::{deserialize_zone_hint, Zone, ZoneSet};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub zones: Option<ZoneSet>,
    pub replay: ReplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Max normalized distance for a detection to continue an existing track
    pub match_threshold: f64,
    /// Max normalized distance at which two same-type tracks are collapsed
    pub merge_threshold: f64,
    /// Max normalized distance at which same-frame detections are collapsed
    pub input_dedup_threshold: f64,
    /// Consecutive confirming frames required to commit a zone change
    pub stability_frames: u32,
    /// Tracks unmatched for longer than this are pruned
    pub stale_ms: f64,
    /// Emit an exit event when a track is pruned while stably in the incision
    pub emit_exit_on_prune: bool,
    /// Classify detections without a zone hint against the configured zones
    pub classify_untagged: bool,
    /// Second-chance matching for very recently seen tracks
    pub rescue: Option<RescueConfig>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.08,
            merge_threshold: 0.08,
            input_dedup_threshold: 0.08,
            stability_frames: 2,
            stale_ms: 3000.0,
            emit_exit_on_prune: false,
            classify_untagged: false,
            rescue: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RescueConfig {
    pub distance: f64,
    pub window_ms: f64,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            distance: 0.15,
            window_ms: 500.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub input_dir: String,
    pub extension: String,
    /// Pace frames by their recorded timestamps instead of as fast as possible
    pub realtime: bool,
    pub speed: f64,
    pub channel_capacity: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            input_dir: "detections".to_string(),
            extension: "jsonl".to_string(),
            realtime: false,
            speed: 1.0,
            channel_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "surgical_tracker=info".to_string(),
        }
    }
}

// ============================================================================
// DETECTION INPUT
// ============================================================================

/// One raw observation from the vision service. Every field is optional on
/// the wire; the engine rejects incomplete or out-of-range detections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "type", default, deserialize_with = "deserialize_item_type")]
    pub item_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_coordinate")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_zone_hint")]
    pub zone: Option<Zone>,
}

impl Detection {
    pub fn new(item_type: impl Into<String>, x: f64, y: f64, zone: Option<Zone>) -> Self {
        Self {
            item_type: Some(item_type.into()),
            x: Some(x),
            y: Some(y),
            zone,
        }
    }
}

/// Accepts numbers and numeric strings; anything else becomes `None` so a
/// single bad coordinate drops one detection instead of the whole frame.
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Only strings name an item type; numbers, objects and the like become
/// `None` and the detection is rejected later.
fn deserialize_item_type<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Decodes the item list entry by entry. An entry that is not a detection
/// object (null, a number, a bare string) becomes an empty `Detection`, which
/// is dropped during hygiene while its neighbours are kept. A non-array item
/// list is treated as missing.
fn deserialize_items<'de, D>(deserializer: D) -> Result<Option<Vec<Detection>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Array(entries)) => Some(
            entries
                .into_iter()
                .map(|entry| serde_json::from_value::<Detection>(entry).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

/// All detections from one analysis cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionFrame {
    #[serde(default)]
    pub timestamp_ms: f64,
    #[serde(default, deserialize_with = "deserialize_items")]
    pub items: Option<Vec<Detection>>,
}

impl DetectionFrame {
    pub fn new(timestamp_ms: f64, items: Vec<Detection>) -> Self {
        Self {
            timestamp_ms,
            items: Some(items),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.as_ref().map_or(true, |items| items.is_empty())
    }
}
