// src/pipeline/mod.rs

pub mod event_log;
pub mod metrics;

pub use event_log::{EventLog, ZoneEvent, ZoneEventKind};
pub use metrics::{MetricsSummary, TrackingMetrics};
