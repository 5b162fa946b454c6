// src/lib.rs
//
// Surgical item tracking: turns noisy per-frame instrument detections into
// stable item tracks with debounced tray/incision membership and an audit
// log of zone crossings.

pub mod config;
pub mod pipeline;
pub mod replay;
pub mod safety;
pub mod tracking;
pub mod types;
pub mod zones;

pub use pipeline::{ZoneEvent, ZoneEventKind};
pub use safety::ClosureVerdict;
pub use tracking::{TrackingEngine, TrackingSnapshot, ZoneCounts};
pub use types::{Config, Detection, DetectionFrame, TrackingConfig};
pub use zones::{Zone, ZoneRect, ZoneSet};
