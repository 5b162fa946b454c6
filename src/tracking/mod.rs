// src/tracking/mod.rs

pub mod engine;
pub mod matching;
pub mod snapshot;
pub mod stability;
pub mod track;

pub use engine::TrackingEngine;
pub use matching::{Observation, Rejection};
pub use snapshot::{FrameReport, TrackingSnapshot, ZoneCounts};
pub use stability::{ZoneStability, ZoneTransition};
pub use track::Track;
